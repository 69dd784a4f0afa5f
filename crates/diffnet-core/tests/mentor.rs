//! Mentor matching on simulated histories and dependent follow-up runs.

#![allow(clippy::unwrap_used)]

use diffnet_core::{
    CohortSource, DiffusionConfig, match_mentors, simulate, simulate_dependent,
};
use diffnet_graph::GeneratorKind;
use diffnet_types::TieBreak;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn prior() -> (DiffusionConfig, diffnet_core::SimulationResult) {
    let config = DiffusionConfig {
        n: 120,
        t: 10,
        graph: GeneratorKind::SmallWorld { k: 6, p: 0.1 },
        seed: diffnet_core::config::SeedConfig {
            p_adopt: 0.2,
            ..Default::default()
        },
        threshold: diffnet_core::ThresholdSampler::Uniform { low: 0.0, high: 0.3 },
        ..DiffusionConfig::default()
    };
    let result = simulate(&config, &mut ChaCha8Rng::seed_from_u64(31)).unwrap();
    (config, result)
}

#[test]
fn one_leader_per_cohort_with_minimum_adoption_time() {
    let (_, result) = prior();
    let labels: Vec<usize> = (0..120).map(|i| i % 4).collect();
    let assignment = match_mentors(
        &result,
        &CohortSource::Assigned { labels },
        TieBreak::FirstId,
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap();

    assert_eq!(assignment.cohorts().len(), 4);
    assert_eq!(assignment.leader_flags().iter().filter(|&&f| f).count(), 4);
    for cohort in assignment.cohorts() {
        let earliest = cohort
            .members
            .iter()
            .filter_map(|&node| result.adoption.time_of(node))
            .min()
            .unwrap();
        assert_eq!(cohort.leader_adoption, earliest);
        assert_eq!(assignment.cohort_of(cohort.leader), Some(cohort.label));
    }
}

#[test]
fn random_tie_break_is_deterministic_under_a_fixed_seed() {
    let (_, result) = prior();
    let source = CohortSource::StructuralEquivalence { k: 5 };
    let a = match_mentors(&result, &source, TieBreak::Random, &mut ChaCha8Rng::seed_from_u64(12)).unwrap();
    let b = match_mentors(&result, &source, TieBreak::Random, &mut ChaCha8Rng::seed_from_u64(12)).unwrap();
    assert_eq!(a.leaders(), b.leaders());
}

#[test]
fn leaders_seed_a_dependent_run_with_identical_thresholds() {
    let (config, result) = prior();
    let labels: Vec<usize> = (0..120).map(|i| i / 30).collect();
    let assignment = match_mentors(
        &result,
        &CohortSource::Assigned { labels },
        TieBreak::HighestDegree,
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap();

    let follow = simulate_dependent(
        &result,
        &config,
        &assignment.seed_strategy(),
        &mut ChaCha8Rng::seed_from_u64(77),
    )
    .unwrap();

    assert_eq!(follow.thresholds().as_slice(), result.thresholds().as_slice());
    assert_eq!(follow.seeds().iter().copied().collect::<Vec<_>>(), assignment.leaders());
    assert_eq!(follow.horizon(), result.horizon());
}
