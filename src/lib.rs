//! # satcache - A Containment Cache for Station Packing Feasibility Queries
//!
//! `satcache` is an in-memory index of previously solved station packing
//! instances. A new feasibility query is answered without invoking a SAT
//! backend whenever it is implied by a cached result: a query whose station
//! set is contained in a previously satisfiable instance reuses that
//! instance's channel assignment (restricted to the query), and a query that
//! contains a previously infeasible instance with equal-or-looser channel
//! domains is itself infeasible.
//!
//! The cache is advisory: a miss never means anything beyond "ask the
//! solver", so stale or pruned entries only cost time, never correctness.
//!
//! ## Features
//!
//! | Feature name | Description |
//! | --- | --- |
//! | `fxhash` | Use the faster firefox hash function from `rustc-hash` in `satcache`. |

pub mod cache;
pub mod fio;
pub mod index;
pub mod permutation;
pub mod types;
