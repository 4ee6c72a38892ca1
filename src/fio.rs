//! # Loading Permutation List Resources
//!
//! Parses the line-oriented permutation resource the cache is constructed
//! from: one permutation per line, station indices comma-separated, least
//! significant position first. Blank lines are skipped. The parse is strict
//! beyond that, since a cache built from a malformed permutation list must
//! never come into existence.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::Context;
use nom::{
    bytes::complete::tag,
    character::complete::{space0, u32},
    combinator::all_consuming,
    multi::separated_list1,
    sequence::delimited,
    IResult,
};
use thiserror::Error;

use crate::permutation::{Permutation, PermutationError};

/// Errors occurring while parsing a permutation list resource
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The resource contains no permutation lines at all
    #[error("the resource contains no permutations")]
    NoPermutations,
    /// A line is not a comma-separated list of station indices
    #[error("line {0}: invalid permutation line: {1}")]
    InvalidLine(usize, String),
    /// A line parsed but does not describe a valid permutation
    #[error("line {0}: {1}")]
    Permutation(usize, PermutationError),
}

/// Parses one permutation line into its priority order
fn permutation_line(input: &str) -> IResult<&str, Vec<u32>> {
    all_consuming(delimited(
        space0,
        separated_list1(delimited(space0, tag(","), space0), u32),
        space0,
    ))(input)
}

/// Parses a permutation list from a reader (typically a file).
///
/// All permutations must have the same width and there must be at least
/// one; any violation is an error, never a partially loaded list.
pub fn parse_permutations<R: BufRead>(reader: R) -> anyhow::Result<Vec<Permutation>> {
    let mut permutations: Vec<Permutation> = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let (_, order) = permutation_line(&line)
            .map_err(|_| Error::InvalidLine(line_no, line.clone()))?;
        let permutation =
            Permutation::new(order).map_err(|e| Error::Permutation(line_no, e))?;
        if let Some(first) = permutations.first() {
            if permutation.width() != first.width() {
                return Err(Error::Permutation(
                    line_no,
                    PermutationError::WidthMismatch {
                        expected: first.width(),
                        found: permutation.width(),
                    },
                )
                .into());
            }
        }
        permutations.push(permutation);
    }
    if permutations.is_empty() {
        return Err(Error::NoPermutations.into());
    }
    Ok(permutations)
}

/// Loads a permutation list from the file at a path
pub fn load_permutations<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Permutation>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open permutation resource {}", path.display()))?;
    parse_permutations(BufReader::new(file))
        .with_context(|| format!("failed to parse permutation resource {}", path.display()))
}
