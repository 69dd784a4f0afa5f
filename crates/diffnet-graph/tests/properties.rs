//! Property tests for rewiring and generated snapshots.

#![allow(clippy::unwrap_used)]

use diffnet_graph::{Adjacency, GeneratorKind, NetworkGenerator, RewireStrategy, Rewirer};
use diffnet_types::NodeId;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn degrees(adj: &Adjacency) -> Vec<(usize, usize)> {
    (0..adj.node_count())
        .filter_map(NodeId::from_index)
        .map(|node| (adj.out_degree(node), adj.in_degree(node)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn degree_preserving_swaps_keep_every_degree(
        n in 4_usize..60,
        p in 0.02_f64..0.5,
        directed in any::<bool>(),
        swaps in 0.0_f64..3.0,
        seed in any::<u64>(),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let adj = GeneratorKind::Bernoulli { p, directed }.generate(n, &mut rng).unwrap();
        let next = RewireStrategy::DegreePreserving { swaps }.rewire(&adj, &mut rng).unwrap();
        prop_assert_eq!(degrees(&next), degrees(&adj));
        prop_assert_eq!(next.edge_count(), adj.edge_count());
        prop_assert_eq!(next.is_symmetric(), adj.is_symmetric());
    }

    #[test]
    fn endpoint_rewiring_keeps_vertices_and_ties(
        n in 4_usize..60,
        p in 0.0_f64..=1.0,
        seed in any::<u64>(),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let adj = GeneratorKind::Ring { k: 2 }.generate(n, &mut rng).unwrap();
        let next = RewireStrategy::Endpoints { p }.rewire(&adj, &mut rng).unwrap();
        prop_assert_eq!(next.node_count(), n);
        prop_assert_eq!(next.edge_count(), adj.edge_count());
        prop_assert!(next.edges().all(|(from, to, _)| from != to));
    }
}
