//! Graph construction from a generated topology or an imported payload.

use std::{collections::HashSet, sync::Arc};

use rand::{Rng, RngCore};
use tracing::{debug, instrument};

use super::{DEFAULT_TRUST, Graph, NodeKey, PreferentialAttachment, generate::GraphGenerator};
use crate::{Result, error::ContagionError};

/// Node entry of an imported graph payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportedNode {
    /// Caller-supplied key.
    pub id: String,
    /// Prior credibility; defaults to [`DEFAULT_TRUST`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub trust: Option<f64>,
    /// Display name to use instead of a derived one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
}

impl ImportedNode {
    /// Creates a node entry with default trust and no name.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            trust: None,
            name: None,
        }
    }

    /// Sets the trust value.
    #[must_use]
    pub const fn with_trust(mut self, trust: f64) -> Self {
        self.trust = Some(trust);
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Link entry of an imported graph payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportedLink {
    /// One endpoint key.
    pub source: String,
    /// The other endpoint key.
    pub target: String,
}

impl ImportedLink {
    /// Creates a link between two keys.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Explicit node and link lists supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomGraph {
    /// Nodes in declaration order.
    pub nodes: Vec<ImportedNode>,
    /// Undirected links between declared nodes.
    pub links: Vec<ImportedLink>,
}

/// How the run's graph is obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphSpec {
    /// A random scale-free graph over the id space `0..nodes`.
    Generated {
        /// Requested node count before blocking.
        nodes: usize,
        /// Generator parameters.
        params: PreferentialAttachment,
    },
    /// A caller-supplied graph.
    Imported(CustomGraph),
}

/// Identifiers excluded from the constructed graph.
///
/// # Examples
/// ```
/// use contagion_core::BlockList;
///
/// let blocked = BlockList::new(["3", "User-5"]);
/// assert!(blocked.blocks_index(3));
/// assert!(blocked.blocks_index(5));
/// assert!(!blocked.blocks_index(4));
/// assert!(blocked.blocks_key("3"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList {
    ids: HashSet<String>,
}

impl BlockList {
    /// Builds a block list from raw identifiers.
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether an imported key is blocked.
    #[must_use]
    pub fn blocks_key(&self, key: &str) -> bool {
        self.ids.contains(key)
    }

    /// Whether a generated index is blocked, either by its plain id or by
    /// its `User-<index>` alias.
    #[must_use]
    pub fn blocks_index(&self, index: usize) -> bool {
        self.ids.contains(&index.to_string()) || self.ids.contains(&format!("User-{index}"))
    }

    /// Number of blocked identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is blocked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Builds the run's graph and derives its features.
///
/// Blocked identifiers are filtered before construction, so neither blocked
/// nodes nor edges touching them are ever added. Import links referring to
/// unknown nodes are dropped silently.
///
/// # Errors
/// Returns [`ContagionError::EmptyGraph`] when a generated graph is empty while
/// `seeds > 0`, [`ContagionError::DuplicateNode`] or
/// [`ContagionError::InvalidTrust`] for malformed imports, and
/// [`ContagionError::InvalidGenerationParams`] when generation parameters are
/// unusable. Imported graphs may be empty.
///
/// # Examples
/// ```
/// use contagion_core::{BlockList, CustomGraph, GraphSpec, ImportedLink, ImportedNode, build_graph};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let shape = GraphSpec::Imported(CustomGraph {
///     nodes: vec![ImportedNode::new("a"), ImportedNode::new("b"), ImportedNode::new("c")],
///     links: vec![ImportedLink::new("a", "b"), ImportedLink::new("b", "c")],
/// });
/// let blocked = BlockList::new(["c"]);
/// let graph = build_graph(&shape, &blocked, 1, &mut SmallRng::seed_from_u64(0))?;
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// # Ok::<(), contagion_core::ContagionError>(())
/// ```
#[instrument(
    name = "graph.build",
    err,
    skip_all,
    fields(blocked = blocked.len(), seeds = seeds)
)]
pub fn build_graph(
    shape: &GraphSpec,
    blocked: &BlockList,
    seeds: usize,
    rng: &mut dyn RngCore,
) -> Result<Graph> {
    match shape {
        GraphSpec::Generated { nodes, params } => {
            build_generated(*nodes, params, blocked, seeds, rng)
        }
        GraphSpec::Imported(custom) => build_imported(custom, blocked),
    }
}

/// Builds a graph from an arbitrary [`GraphGenerator`] over `0..nodes`.
///
/// Generated nodes draw trust uniformly from `[0.1, 0.9)`.
///
/// # Errors
/// Returns [`ContagionError::EmptyGraph`] when no node survives blocking while
/// seeds are requested, or the generator's own error.
pub fn build_generated(
    nodes: usize,
    generator: &dyn GraphGenerator,
    blocked: &BlockList,
    seeds: usize,
    rng: &mut dyn RngCore,
) -> Result<Graph> {
    let edges = generator.generate(nodes, rng)?;
    let mut graph = Graph::default();
    // `nodes` is caller-controlled, so the buffer grows instead of pre-sizing.
    let mut ids = Vec::new();
    for index in 0..nodes {
        let trust = rng.gen_range(0.1..0.9);
        ids.push((!blocked.blocks_index(index)).then(|| {
            graph.add_node(NodeKey::Index(index as u64), trust, None)
        }));
    }
    for (left, right) in edges {
        let endpoints = ids.get(left).copied().flatten().zip(ids.get(right).copied().flatten());
        if let Some((left_id, right_id)) = endpoints {
            graph.add_edge(left_id, right_id);
        }
    }

    if graph.is_empty() && seeds > 0 {
        return Err(ContagionError::EmptyGraph { seeds });
    }
    graph.derive_features();
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "generated graph constructed"
    );
    Ok(graph)
}

fn build_imported(custom: &CustomGraph, blocked: &BlockList) -> Result<Graph> {
    let mut graph = Graph::default();
    let mut declared = HashSet::new();
    for node in &custom.nodes {
        if !declared.insert(node.id.as_str()) {
            return Err(ContagionError::DuplicateNode {
                id: Arc::from(node.id.as_str()),
            });
        }
        let trust = node.trust.unwrap_or(DEFAULT_TRUST);
        if !(0.0..=1.0).contains(&trust) {
            return Err(ContagionError::InvalidTrust {
                id: Arc::from(node.id.as_str()),
                trust,
            });
        }
        if blocked.blocks_key(&node.id) {
            continue;
        }
        graph.add_node(NodeKey::Named(node.id.clone()), trust, node.name.clone());
    }

    let endpoints: Vec<_> = custom
        .links
        .iter()
        .filter_map(|link| {
            graph
                .find(&NodeKey::Named(link.source.clone()))
                .zip(graph.find(&NodeKey::Named(link.target.clone())))
        })
        .collect();
    let dropped = custom.links.len() - endpoints.len();
    for (source, target) in endpoints {
        graph.add_edge(source, target);
    }
    if dropped > 0 {
        debug!(dropped, "dropped imported links to absent or blocked nodes");
    }

    graph.derive_features();
    Ok(graph)
}
