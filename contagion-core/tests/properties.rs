//! Property suites for run invariants and graph construction.

mod common;

use std::collections::HashSet;

use common::{FixedRisk, UniformOracle};
use contagion_core::{
    BlockList, Collaborators, ContagionErrorCode, CustomGraph, GraphSpec, ImportedLink,
    ImportedNode, NodeKey, PreferentialAttachment, RunConfigBuilder, RunPhase, SimulationEngine,
    build_graph,
};
use contagion_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::{prelude::*, test_runner::TestCaseError};
use rand::{SeedableRng, rngs::SmallRng};

fn suite_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

#[derive(Debug, Clone)]
struct RunScenario {
    nodes: i64,
    seeds: i64,
    steps: usize,
    structural: f64,
    risk: f64,
    rng_seed: u64,
    blocked: Vec<String>,
}

fn scenario() -> impl Strategy<Value = RunScenario> {
    (
        0_i64..60,
        0_i64..8,
        1_usize..8,
        0.0_f64..=1.0,
        0.0_f64..=1.0,
        any::<u64>(),
        proptest::collection::vec(0_u32..60, 0..6),
    )
        .prop_map(|(nodes, seeds, steps, structural, risk, rng_seed, blocked)| RunScenario {
            nodes,
            seeds,
            steps,
            structural,
            risk,
            rng_seed,
            blocked: blocked.into_iter().map(|index| index.to_string()).collect(),
        })
}

fn fail(error: impl std::fmt::Display) -> TestCaseError {
    TestCaseError::fail(error.to_string())
}

fn check_round_invariants(scenario: &RunScenario) -> Result<(), TestCaseError> {
    let oracle = UniformOracle(scenario.structural);
    let risk = FixedRisk::new(scenario.risk);
    let engine = SimulationEngine::new(Collaborators::new(&oracle, &risk));
    let config = RunConfigBuilder::new()
        .with_num_nodes(scenario.nodes)
        .with_seed_nodes(scenario.seeds)
        .with_steps(scenario.steps)
        .with_rng_seed(scenario.rng_seed)
        .with_blocked_ids(scenario.blocked.clone())
        .build()
        .map_err(fail)?;

    let mut simulation = match engine.initialize(&config) {
        Ok(simulation) => simulation,
        Err(error) => {
            prop_assert_eq!(error.code(), ContagionErrorCode::EmptyGraph);
            prop_assert!(scenario.seeds > 0);
            return Ok(());
        }
    };
    let seeded = simulation.seed().map_err(fail)?;
    prop_assert_eq!(
        seeded,
        usize::try_from(scenario.seeds)
            .map_err(fail)?
            .min(simulation.graph().node_count())
    );

    let mut previous: HashSet<_> = simulation.graph().infected().into_iter().collect();
    let mut transmissions = 0_u64;
    while simulation.phase() == RunPhase::Stepping {
        let record = simulation.step().map_err(fail)?;
        let current: HashSet<_> = simulation.graph().infected().into_iter().collect();

        prop_assert!(previous.is_subset(&current), "infection reverted");
        prop_assert_eq!(record.active_spreaders, previous.len());
        prop_assert_eq!(record.total_reach, current.len());
        prop_assert_eq!(
            record.total_reach,
            previous.len() + record.newly_activated.len()
        );

        let targets: Vec<&str> = record
            .activation_paths
            .iter()
            .map(|path| path.target())
            .collect();
        let newly: Vec<&str> = record.newly_activated.iter().map(String::as_str).collect();
        prop_assert_eq!(&targets, &newly);
        let unique: HashSet<&str> = targets.iter().copied().collect();
        prop_assert_eq!(unique.len(), targets.len(), "target activated twice");

        for pair in record.live_top_5.windows(2) {
            prop_assert!(pair[0].count >= pair[1].count);
        }
        prop_assert!(record.live_top_5.len() <= 5);

        transmissions += record.activation_paths.len() as u64;
        prop_assert_eq!(simulation.ledger().total(), transmissions);
        previous = current;
    }
    Ok(())
}

fn imported_graph() -> impl Strategy<Value = (CustomGraph, Vec<String>)> {
    (
        1_usize..20,
        proptest::collection::vec((0_usize..24, 0_usize..24), 0..40),
        proptest::collection::vec(0_usize..24, 0..6),
    )
        .prop_map(|(size, links, blocked)| {
            let graph = CustomGraph {
                nodes: (0..size)
                    .map(|index| ImportedNode::new(format!("k{index}")))
                    .collect(),
                links: links
                    .into_iter()
                    .map(|(left, right)| ImportedLink::new(format!("k{left}"), format!("k{right}")))
                    .collect(),
            };
            let blocked = blocked.into_iter().map(|index| format!("k{index}")).collect();
            (graph, blocked)
        })
}

proptest! {
    #![proptest_config(suite_config(48))]

    #[test]
    fn rounds_preserve_accounting_invariants(scenario in scenario()) {
        check_round_invariants(&scenario)?;
    }

    #[test]
    fn identical_inputs_give_identical_runs(scenario in scenario()) {
        let oracle = UniformOracle(scenario.structural);
        let risk = FixedRisk::new(scenario.risk);
        let engine = SimulationEngine::new(Collaborators::new(&oracle, &risk));
        let config = RunConfigBuilder::new()
            .with_num_nodes(scenario.nodes)
            .with_seed_nodes(scenario.seeds)
            .with_steps(scenario.steps)
            .with_rng_seed(scenario.rng_seed)
            .with_blocked_ids(scenario.blocked.clone())
            .build()
            .map_err(fail)?;
        prop_assert_eq!(engine.run(&config), engine.run(&config));
    }

    #[test]
    fn generated_graphs_exclude_blocked_indices(
        nodes in 0_usize..80,
        blocked in proptest::collection::vec(0_usize..80, 0..10),
        alias in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let ids: Vec<String> = blocked
            .iter()
            .map(|index| if alias { format!("User-{index}") } else { index.to_string() })
            .collect();
        let shape = GraphSpec::Generated { nodes, params: PreferentialAttachment::default() };
        let graph = build_graph(&shape, &BlockList::new(ids), 0, &mut SmallRng::seed_from_u64(seed))
            .map_err(fail)?;

        let excluded: HashSet<usize> = blocked.iter().copied().filter(|&index| index < nodes).collect();
        prop_assert_eq!(graph.node_count(), nodes - excluded.len());
        for (_, node) in graph.nodes() {
            if let NodeKey::Index(index) = node.key() {
                let index = usize::try_from(*index).map_err(fail)?;
                prop_assert!(!excluded.contains(&index));
            }
        }
        let edges_in_bounds = graph.edges().all(|(left, right)| {
            left.get() < graph.node_count() && right.get() < graph.node_count()
        });
        prop_assert!(edges_in_bounds);
    }

    #[test]
    fn imported_graphs_exclude_blocked_keys((custom, blocked) in imported_graph()) {
        let block_list = BlockList::new(blocked.iter().cloned());
        let graph = build_graph(
            &GraphSpec::Imported(custom),
            &block_list,
            0,
            &mut SmallRng::seed_from_u64(0),
        )
        .map_err(fail)?;

        let topology = graph.topology();
        for node in &topology.nodes {
            prop_assert!(!blocked.contains(&node.id.to_string()));
        }
        for link in &topology.links {
            prop_assert!(!blocked.contains(&link.source.to_string()));
            prop_assert!(!blocked.contains(&link.target.to_string()));
            prop_assert_ne!(&link.source, &link.target);
        }
    }
}
