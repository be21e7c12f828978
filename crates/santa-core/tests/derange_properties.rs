//! Property-based tests for the derangement engine using proptest.
//!
//! Invariants tested:
//! - Every id is a santa exactly once and a child exactly once
//! - No id is assigned to itself
//! - Fewer than two ids is always rejected

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use santa_core::{derange, Error, ParticipantId};

/// Optimized proptest config for derangement properties.
fn derange_config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        max_shrink_iters: 256,
        ..ProptestConfig::default()
    }
}

/// Strategy for a set of 2..=40 distinct valid ids
fn id_set_strategy() -> impl Strategy<Value = Vec<ParticipantId>> {
    proptest::collection::btree_set("[a-z][a-z0-9_]{0,11}", 2..=40).prop_map(|names| {
        names
            .into_iter()
            .map(|n| ParticipantId::parse(&n).expect("strategy yields valid ids"))
            .collect()
    })
}

proptest! {
    #![proptest_config(derange_config())]

    #[test]
    fn prop_result_is_fixed_point_free_bijection(ids in id_set_strategy(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let result = derange(&ids, &mut rng).unwrap();

        let santas: BTreeSet<_> = result.mapping.iter().map(|(s, _)| s.clone()).collect();
        let children: BTreeSet<_> = result.mapping.iter().map(|(_, c)| c.clone()).collect();
        let expected: BTreeSet<_> = ids.iter().cloned().collect();

        prop_assert_eq!(result.mapping.len(), ids.len());
        prop_assert_eq!(&santas, &expected);
        prop_assert_eq!(&children, &expected);
        prop_assert!(result.mapping.iter().all(|(s, c)| s != c));
        prop_assert!(result.mapping.is_derangement());
        prop_assert!(result.attempts >= 1);
    }

    #[test]
    fn prop_seed_determines_outcome(ids in id_set_strategy(), seed in any::<u64>()) {
        let first = derange(&ids, &mut StdRng::seed_from_u64(seed)).unwrap();
        let second = derange(&ids, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_singletons_are_rejected(name in "[a-z]{1,10}", seed in any::<u64>()) {
        let ids = vec![ParticipantId::parse(&name).unwrap()];
        let result = derange(&ids, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(result, Err(Error::InsufficientParticipants { found: 1 }));
    }
}

#[test]
fn test_empty_input_is_rejected() {
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(
        derange(&[], &mut rng),
        Err(Error::InsufficientParticipants { found: 0 })
    );
}
