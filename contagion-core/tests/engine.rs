//! Behavioural tests for `SimulationEngine` runs.

mod common;

use std::collections::HashSet;

use common::{FailingOracle, FixedRisk, FixedTuner, SilentOracle, UniformOracle, ring};
use contagion_core::{
    Collaborators, CustomGraph, ImportedLink, ImportedNode, InfectionOracle, RunConfig,
    RunConfigBuilder, RunOutput, SimulationEngine, Strategy, TextRiskOracle,
};
use rstest::rstest;

fn ring_config(strategy: Strategy, rng_seed: u64, steps: usize) -> RunConfig {
    RunConfigBuilder::new()
        .with_custom_graph(ring(10))
        .with_seed_nodes(1)
        .with_steps(steps)
        .with_strategy(strategy)
        .with_rng_seed(rng_seed)
        .build()
        .expect("ring configuration is valid")
}

fn run_with(
    oracle: &dyn InfectionOracle,
    risk: &dyn TextRiskOracle,
    config: &RunConfig,
) -> RunOutput {
    SimulationEngine::new(Collaborators::new(oracle, risk))
        .run(config)
        .expect("run must succeed")
}

/// Mean of newly activated nodes in the first round over many seeds.
fn mean_first_round_activations(engine: &SimulationEngine<'_>, strategy: Strategy) -> f64 {
    const RUNS: u64 = 2_000;
    let total: usize = (0..RUNS)
        .map(|seed| {
            let output = engine
                .run(&ring_config(strategy, seed, 1))
                .expect("run must succeed");
            output.results[0].newly_activated.len()
        })
        .sum();
    total as f64 / RUNS as f64
}

#[test]
fn ring_first_round_matches_expected_probability() {
    let oracle = UniformOracle(0.5);
    let risk = FixedRisk::new(0.0);
    let engine = SimulationEngine::new(Collaborators::new(&oracle, &risk));

    // One seed on a ring has two susceptible neighbours, each reached with p = 0.4.
    let mean = mean_first_round_activations(&engine, Strategy::Naive);
    assert!((mean - 0.8).abs() < 0.08, "mean activations {mean}");
}

#[test]
fn suppression_of_two_halves_the_spread() {
    let oracle = UniformOracle(0.5);
    let risk = FixedRisk::new(0.0);
    let tuner = FixedTuner(2.0);
    let engine = SimulationEngine::new(Collaborators::new(&oracle, &risk).with_tuner(&tuner));

    let baseline = mean_first_round_activations(&engine, Strategy::Naive);
    let suppressed = mean_first_round_activations(&engine, Strategy::GeneticOptimized);
    assert!((suppressed - 0.4).abs() < 0.06, "suppressed mean {suppressed}");
    assert!(
        (suppressed / baseline - 0.5).abs() < 0.1,
        "ratio {}",
        suppressed / baseline
    );
}

#[test]
fn certain_transmission_sweeps_the_ring() {
    let oracle = UniformOracle(1.0);
    let risk = FixedRisk::new(1.0);
    let output = run_with(&oracle, &risk, &ring_config(Strategy::Naive, 3, 6));

    let reach: Vec<usize> = output.results.iter().map(|record| record.total_reach).collect();
    assert_eq!(reach, [3, 5, 7, 9, 10, 10]);
    let active: Vec<usize> = output
        .results
        .iter()
        .map(|record| record.active_spreaders)
        .collect();
    assert_eq!(active, [1, 3, 5, 7, 9, 10]);
    assert!(output.results[5].newly_activated.is_empty());
}

#[test]
fn text_risk_is_scored_once_per_run() {
    let oracle = UniformOracle(0.3);
    let risk = FixedRisk::new(0.6);
    let output = run_with(&oracle, &risk, &ring_config(Strategy::FuzzyAdaptive, 1, 8));
    assert_eq!(risk.calls(), 1);
    assert_eq!(output.metadata.calculated_risk, 0.6);
    assert_eq!(output.metadata.strategy_used, Strategy::FuzzyAdaptive);
    assert!(output.metadata.ga_params.is_none());
}

#[test]
fn genetic_runs_report_tuned_parameters() {
    let oracle = UniformOracle(0.3);
    let risk = FixedRisk::new(0.2);
    let tuner = FixedTuner(1.25);
    let engine = SimulationEngine::new(Collaborators::new(&oracle, &risk).with_tuner(&tuner));
    let output = engine
        .run(&ring_config(Strategy::GeneticOptimized, 4, 3))
        .expect("run must succeed");
    let params = output.metadata.ga_params.expect("tuned parameters are reported");
    assert_eq!(params.suppression, 1.25);
}

#[rstest]
#[case::silent(&SilentOracle)]
#[case::failing(&FailingOracle)]
fn degraded_oracles_fall_back_to_default_probability(#[case] degraded: &dyn InfectionOracle) {
    // The default structural probability 0.1 yields p = 0.08 with zero risk.
    let reference = UniformOracle(0.1);
    let risk = FixedRisk::new(0.0);
    for seed in 0..20 {
        let config = ring_config(Strategy::Naive, seed, 5);
        assert_eq!(
            run_with(degraded, &risk, &config),
            run_with(&reference, &risk, &config)
        );
    }
}

#[test]
fn seeds_are_capped_by_node_count() {
    let oracle = UniformOracle(0.0);
    let risk = FixedRisk::new(0.0);
    let config = RunConfigBuilder::new()
        .with_custom_graph(ring(4))
        .with_seed_nodes(50)
        .with_steps(2)
        .build()
        .expect("configuration is valid");
    let output = run_with(&oracle, &risk, &config);
    assert!(output.results.iter().all(|record| record.total_reach == 4));
    assert!(output.results.iter().all(|record| record.active_spreaders == 4));
}

#[test]
fn zero_seeds_never_spread() {
    let oracle = UniformOracle(1.0);
    let risk = FixedRisk::new(1.0);
    let config = RunConfigBuilder::new()
        .with_num_nodes(30)
        .with_seed_nodes(0)
        .with_steps(3)
        .build()
        .expect("configuration is valid");
    let output = run_with(&oracle, &risk, &config);
    assert!(output.results.iter().all(|record| record.total_reach == 0));
}

#[test]
fn empty_import_completes_every_round() {
    let oracle = UniformOracle(0.9);
    let risk = FixedRisk::new(0.9);
    let config = RunConfigBuilder::new()
        .with_custom_graph(CustomGraph::default())
        .with_seed_nodes(5)
        .with_steps(15)
        .build()
        .expect("configuration is valid");
    let output = run_with(&oracle, &risk, &config);
    assert_eq!(output.results.len(), 15);
    for (timestep, record) in output.results.iter().enumerate() {
        assert_eq!(record.timestep, timestep);
        assert_eq!(record.total_reach, 0);
        assert!(record.live_top_5.is_empty());
    }
}

#[test]
fn leaderboard_credits_the_hub() {
    let mut graph = CustomGraph::default();
    graph.nodes.push(ImportedNode::new("hub").with_name("Hub"));
    for index in 0..6 {
        let leaf = format!("leaf{index}");
        graph.nodes.push(ImportedNode::new(leaf.clone()));
        graph.links.push(ImportedLink::new("hub", leaf));
    }
    let oracle = UniformOracle(1.0);
    let risk = FixedRisk::new(1.0);
    let mut credited_hub = false;
    for seed in 0..64 {
        let config = RunConfigBuilder::new()
            .with_custom_graph(graph.clone())
            .with_seed_nodes(1)
            .with_steps(2)
            .with_rng_seed(seed)
            .build()
            .expect("configuration is valid");
        let output = run_with(&oracle, &risk, &config);
        let last = output.last_step().expect("two rounds ran");
        assert_eq!(last.total_reach, 7);
        credited_hub |= last
            .live_top_5
            .first()
            .is_some_and(|leader| leader.id == "Hub" && leader.count == 6);
    }
    assert!(credited_hub, "a hub seed must credit six transmissions");
}

#[test]
fn blocked_nodes_never_appear_in_output() {
    let oracle = UniformOracle(1.0);
    let risk = FixedRisk::new(1.0);
    let config = RunConfigBuilder::new()
        .with_custom_graph(ring(10))
        .with_blocked_ids(["n3", "n7"])
        .with_seed_nodes(2)
        .with_steps(10)
        .build()
        .expect("configuration is valid");
    let output = run_with(&oracle, &risk, &config);
    let blocked: HashSet<&str> = ["n3", "n7"].into_iter().collect();
    assert_eq!(output.graph_topology.nodes.len(), 8);
    for node in &output.graph_topology.nodes {
        assert!(!blocked.contains(node.id.to_string().as_str()));
    }
    for link in &output.graph_topology.links {
        assert!(!blocked.contains(link.source.to_string().as_str()));
        assert!(!blocked.contains(link.target.to_string().as_str()));
    }
}

#[test]
fn runs_are_reproducible_and_seed_sensitive() {
    let oracle = UniformOracle(0.4);
    let risk = FixedRisk::new(0.3);
    let config = |seed| {
        RunConfigBuilder::new()
            .with_num_nodes(120)
            .with_seed_nodes(3)
            .with_steps(10)
            .with_rng_seed(seed)
            .build()
            .expect("configuration is valid")
    };
    let first = run_with(&oracle, &risk, &config(99));
    let second = run_with(&oracle, &risk, &config(99));
    assert_eq!(first, second);
    assert_eq!(format!("{first:?}"), format!("{second:?}"));

    let other = run_with(&oracle, &risk, &config(100));
    assert_ne!(first, other, "different seeds should diverge on a 120-node graph");
}

#[cfg(feature = "serde")]
#[test]
fn serialised_output_is_byte_identical_across_runs() {
    let oracle = UniformOracle(0.4);
    let risk = FixedRisk::new(0.3);
    let config = ring_config(Strategy::Naive, 12, 6);
    let first = serde_json::to_vec(&run_with(&oracle, &risk, &config)).expect("serialises");
    let second = serde_json::to_vec(&run_with(&oracle, &risk, &config)).expect("serialises");
    assert_eq!(first, second);

    let value: serde_json::Value = serde_json::from_slice(&first).expect("valid JSON");
    let record = &value["results"][0];
    for key in [
        "timestep",
        "active_spreaders",
        "total_reach",
        "newly_activated",
        "activation_paths",
        "live_top_5",
    ] {
        assert!(record.get(key).is_some(), "missing field {key}");
    }
    assert_eq!(value["metadata"]["strategy_used"], "naive");
}
