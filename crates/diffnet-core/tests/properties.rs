//! Property tests for seeding, adoption state, and cumulative adoption.

#![allow(clippy::unwrap_used)]

use diffnet_core::seed::seed_count;
use diffnet_core::{AdoptionState, AttributeTable, DiffusionConfig, SeedStrategy, select_seeds, simulate};
use diffnet_graph::{Adjacency, GeneratorKind};
use diffnet_types::NodeId;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_seeds_are_exact_and_distinct(n in 1_usize..400, p in 0.001_f64..=1.0, seed in any::<u64>()) {
        let strategy = SeedStrategy::Random { proportion: p };
        let seeds = select_seeds(
            n,
            &strategy,
            &AttributeTable::new(n, 1),
            &Adjacency::new(n),
            &mut ChaCha8Rng::seed_from_u64(seed),
        )
        .unwrap();
        let expected = seed_count(p, n).unwrap();
        prop_assert_eq!(seeds.len(), expected);
        prop_assert!(seeds.iter().all(|node| node.index() < n));
        #[allow(clippy::cast_precision_loss)]
        let (lower, drawn) = (p * n as f64, expected as f64);
        prop_assert!(drawn >= lower - 1e-6);
        prop_assert!(drawn < lower + 1.0);
    }

    #[test]
    fn adoption_times_never_change(
        writes in proptest::collection::vec((0_u32..20, 1_u32..10), 1..60)
    ) {
        let mut state = AdoptionState::new(20);
        let mut first = vec![None; 20];
        for (node, t) in writes {
            let slot = first.get_mut(node as usize).unwrap();
            let outcome = state.adopt(NodeId(node), t);
            if slot.is_none() {
                prop_assert!(outcome.is_ok());
                *slot = Some(t);
            } else {
                prop_assert!(outcome.is_err());
            }
            prop_assert_eq!(state.time_of(NodeId(node)), *slot);
        }
    }

    #[test]
    fn cumulative_adoption_is_non_decreasing(seed in any::<u64>(), p in 0.01_f64..0.5) {
        let config = DiffusionConfig {
            n: 80,
            t: 8,
            graph: GeneratorKind::SmallWorld { k: 4, p },
            rewire: seed % 2 == 0,
            ..DiffusionConfig::default()
        };
        let result = simulate(&config, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
        let counts = result.cumulative_adoption().counts;
        prop_assert_eq!(counts.len(), 8);
        prop_assert!(counts.windows(2).all(|w| w.first() <= w.get(1)));
        let proportions = result.cumulative_adoption().proportions;
        prop_assert!(proportions.iter().all(|share| (0.0..=1.0).contains(share)));
    }
}
