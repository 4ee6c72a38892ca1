use satcache::{
    cache::SatisfiabilityCache,
    permutation::Permutation,
    types::{Assignment, Channel, Instance, RsHashMap, RsHashSet, SolverResult, Station},
};

fn instance(domains: &[(u32, &[u16])]) -> Instance {
    let mut map = RsHashMap::default();
    for &(s, chs) in domains {
        map.insert(
            Station::new(s),
            chs.iter().map(|&c| Channel::new(c)).collect::<RsHashSet<_>>(),
        );
    }
    Instance::new(map)
}

fn sat_result(pairs: &[(u32, u16)]) -> SolverResult {
    SolverResult::Sat(Assignment::from_station_channels(
        pairs
            .iter()
            .map(|&(s, c)| (Station::new(s), Channel::new(c))),
    ))
}

fn cache() -> SatisfiabilityCache {
    let perms = vec![
        Permutation::identity(16),
        Permutation::new((0..16u32).rev().collect()).unwrap(),
        Permutation::new(vec![1, 3, 5, 7, 9, 11, 13, 15, 0, 2, 4, 6, 8, 10, 12, 14]).unwrap(),
    ];
    SatisfiabilityCache::new(perms).unwrap()
}

#[test]
fn empty_cache_misses() {
    let cache = cache();
    let query = instance(&[(1, &[14]), (2, &[14]), (3, &[14])]);
    assert!(cache.prove_sat_by_superset(&query).is_none());
    assert!(cache.prove_unsat_by_subset(&query).is_none());
}

#[test]
fn sat_hit_by_superset_projects_the_assignment() {
    let cache = cache();
    cache
        .add(
            &instance(&[(1, &[14]), (2, &[14])]),
            &sat_result(&[(1, 14), (2, 15)]),
            "k1",
        )
        .unwrap();

    let hit = cache
        .prove_sat_by_superset(&instance(&[(1, &[14])]))
        .unwrap();
    assert_eq!(hit.key, "k1");
    assert_eq!(hit.assignment.n_stations(), 1);
    assert_eq!(
        hit.assignment.channel_of(Station::new(1)),
        Some(Channel::new(14))
    );
    // station 2 is not part of the query, so it must not leak into the
    // projected assignment
    assert_eq!(hit.assignment.channel_of(Station::new(2)), None);
}

#[test]
fn sat_hit_respects_query_domains() {
    let cache = cache();
    cache
        .add(
            &instance(&[(1, &[14]), (2, &[14])]),
            &sat_result(&[(1, 14), (2, 15)]),
            "k1",
        )
        .unwrap();

    // the cached assignment puts station 2 on channel 15, which this
    // query's domain does not allow
    assert!(cache
        .prove_sat_by_superset(&instance(&[(2, &[14])]))
        .is_none());
}

#[test]
fn unsat_hit_by_subset() {
    let cache = cache();
    cache
        .add(
            &instance(&[(1, &[14, 15]), (2, &[14, 15])]),
            &SolverResult::Unsat,
            "k2",
        )
        .unwrap();

    let hit = cache
        .prove_unsat_by_subset(&instance(&[(1, &[14]), (2, &[14])]))
        .unwrap();
    assert_eq!(hit.key, "k2");

    // a looser domain is not implied infeasible
    assert!(cache
        .prove_unsat_by_subset(&instance(&[(1, &[14, 15, 16])]))
        .is_none());
    // neither is a query missing one of the entry's stations
    assert!(cache
        .prove_unsat_by_subset(&instance(&[(1, &[14])]))
        .is_none());
}

#[test]
fn exact_match_hits() {
    let cache = cache();
    cache
        .add(
            &instance(&[(3, &[14]), (7, &[15])]),
            &sat_result(&[(3, 14), (7, 15)]),
            "exact",
        )
        .unwrap();

    let hit = cache
        .prove_sat_by_superset(&instance(&[(3, &[14]), (7, &[15])]))
        .unwrap();
    assert_eq!(hit.key, "exact");
    assert_eq!(hit.assignment.n_stations(), 2);
}

#[test]
fn filter_sat_prunes_the_weaker_entry() {
    let cache = cache();
    cache
        .add(
            &instance(&[(1, &[14]), (2, &[14, 15])]),
            &sat_result(&[(1, 14), (2, 15)]),
            "k1",
        )
        .unwrap();
    // strictly weaker: covers only station 1, with the same channel
    cache
        .add(&instance(&[(1, &[14])]), &sat_result(&[(1, 14)]), "weak")
        .unwrap();

    let removed = cache.filter_sat();
    assert_eq!(removed, vec!["weak".to_owned()]);
    assert_eq!(cache.len_sat(), 1);

    // the pass is idempotent
    assert!(cache.filter_sat().is_empty());

    // queries the weak entry answered are still answered by the survivor
    let hit = cache
        .prove_sat_by_superset(&instance(&[(1, &[14])]))
        .unwrap();
    assert_eq!(hit.key, "k1");
}

#[test]
fn filter_sat_keeps_disagreeing_entries() {
    let cache = cache();
    cache
        .add(
            &instance(&[(1, &[14, 16]), (2, &[15])]),
            &sat_result(&[(1, 16), (2, 15)]),
            "big",
        )
        .unwrap();
    // same station subset, but a different channel for station 1: a query
    // with domain {14} is only answered by this entry
    cache
        .add(&instance(&[(1, &[14])]), &sat_result(&[(1, 14)]), "small")
        .unwrap();

    assert!(cache.filter_sat().is_empty());
    assert_eq!(cache.len_sat(), 2);
}

#[test]
fn filter_unsat_prunes_the_more_restrictive_entry() {
    let cache = cache();
    cache
        .add(&instance(&[(1, &[14, 15])]), &SolverResult::Unsat, "general")
        .unwrap();
    cache
        .add(
            &instance(&[(1, &[14]), (2, &[14])]),
            &SolverResult::Unsat,
            "specific",
        )
        .unwrap();

    let removed = cache.filter_unsat();
    assert_eq!(removed, vec!["specific".to_owned()]);
    assert!(cache.filter_unsat().is_empty());

    // the query the specific entry answered is still answered
    let hit = cache
        .prove_unsat_by_subset(&instance(&[(1, &[14]), (2, &[14])]))
        .unwrap();
    assert_eq!(hit.key, "general");
}

#[test]
fn duplicate_entries_tie_break_on_key() {
    let cache = cache();
    let inst = instance(&[(4, &[14])]);
    cache.add(&inst, &sat_result(&[(4, 14)]), "b").unwrap();
    cache.add(&inst, &sat_result(&[(4, 14)]), "a").unwrap();

    let removed = cache.filter_sat();
    assert_eq!(removed, vec!["b".to_owned()]);
    let hit = cache.prove_sat_by_superset(&inst).unwrap();
    assert_eq!(hit.key, "a");

    cache.add(&inst, &SolverResult::Unsat, "d").unwrap();
    cache.add(&inst, &SolverResult::Unsat, "c").unwrap();
    let removed = cache.filter_unsat();
    assert_eq!(removed, vec!["d".to_owned()]);
}

#[test]
fn sat_soundness_under_random_load() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(42);
    let cache = cache();

    for i in 0..200 {
        let n_stations = rng.gen_range(1..=5);
        let mut pairs = Vec::new();
        let mut seen = RsHashSet::default();
        for _ in 0..n_stations {
            let s = rng.gen_range(0..16u32);
            if seen.insert(s) {
                pairs.push((s, rng.gen_range(14..20u16)));
            }
        }
        let domains: Vec<(u32, Vec<u16>)> = pairs
            .iter()
            .map(|&(s, c)| (s, vec![c, rng.gen_range(14..20u16)]))
            .collect();
        let domain_refs: Vec<(u32, &[u16])> = domains
            .iter()
            .map(|(s, chs)| (*s, chs.as_slice()))
            .collect();
        cache
            .add(&instance(&domain_refs), &sat_result(&pairs), &format!("e{i}"))
            .unwrap();
    }

    for _ in 0..500 {
        let n_stations = rng.gen_range(1..=4);
        let mut domains = Vec::new();
        let mut seen = RsHashSet::default();
        for _ in 0..n_stations {
            let s = rng.gen_range(0..16u32);
            if seen.insert(s) {
                domains.push((s, vec![rng.gen_range(14..20u16), rng.gen_range(14..20u16)]));
            }
        }
        let domain_refs: Vec<(u32, &[u16])> = domains
            .iter()
            .map(|(s, chs)| (*s, chs.as_slice()))
            .collect();
        let query = instance(&domain_refs);

        if let Some(hit) = cache.prove_sat_by_superset(&query) {
            let station_channels = hit.assignment.station_channels();
            // the projected assignment covers exactly the query's stations
            assert_eq!(station_channels.len(), query.len());
            for (station, channel) in station_channels {
                let domain = query.domain(station).expect("station not part of query");
                assert!(domain.contains(&channel), "assignment violates a domain");
            }
        }
    }
}
