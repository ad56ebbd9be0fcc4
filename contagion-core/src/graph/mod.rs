//! Mutable social graph owned by a single simulation run.
//!
//! Nodes live in an arena addressed by [`NodeId`]; adjacency is an ordered
//! set of arena indices per node so neighbour iteration is deterministic.
//! Infection state is mutated through [`Graph::set_state`] only.

mod build;
mod generate;

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

pub use self::{
    build::{
        BlockList, CustomGraph, GraphSpec, ImportedLink, ImportedNode, build_generated, build_graph,
    },
    generate::{GeneratedEdges, GraphGenerator, PreferentialAttachment},
};

/// Trust assigned to imported nodes that do not declare one.
pub const DEFAULT_TRUST: f64 = 0.5;

/// Stable external identifier of a node.
///
/// Generated graphs use integer indices; imported graphs keep the caller's
/// string keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum NodeKey {
    /// Index in a generated id space.
    Index(u64),
    /// Key supplied by an imported payload.
    Named(String),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Arena index of a node within one [`Graph`].
///
/// # Examples
/// ```
/// use contagion_core::NodeId;
///
/// let id = NodeId::new(3);
/// assert_eq!(id.get(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a node identifier from an arena index.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(index: usize) -> Self { Self(index) }

    /// Returns the underlying arena index.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> usize { self.0 }
}

/// Infection state of a node. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InfectionState {
    /// The node has not received the message.
    #[default]
    Susceptible,
    /// The node has received and is spreading the message.
    Infected,
}

impl InfectionState {
    /// Numeric encoding used as a model feature (`0.0` or `1.0`).
    #[must_use]
    pub const fn as_feature(self) -> f64 {
        match self {
            Self::Susceptible => 0.0,
            Self::Infected => 1.0,
        }
    }
}

/// Influence bucket derived from normalised degree, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InfluenceTier {
    /// Influence above 0.8.
    Titan,
    /// Influence above 0.6.
    Mega,
    /// Influence above 0.4.
    Macro,
    /// Influence above 0.2.
    Micro,
    /// Everything else.
    #[default]
    Nano,
}

impl InfluenceTier {
    /// Buckets a normalised influence score.
    ///
    /// # Examples
    /// ```
    /// use contagion_core::InfluenceTier;
    ///
    /// assert_eq!(InfluenceTier::from_influence(0.81), InfluenceTier::Titan);
    /// assert_eq!(InfluenceTier::from_influence(0.8), InfluenceTier::Mega);
    /// assert_eq!(InfluenceTier::from_influence(0.0), InfluenceTier::Nano);
    /// ```
    #[must_use]
    pub const fn from_influence(influence: f64) -> Self {
        if influence > 0.8 {
            Self::Titan
        } else if influence > 0.6 {
            Self::Mega
        } else if influence > 0.4 {
            Self::Macro
        } else if influence > 0.2 {
            Self::Micro
        } else {
            Self::Nano
        }
    }

    /// Returns the tier name used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Titan => "Titan",
            Self::Mega => "Mega",
            Self::Macro => "Macro",
            Self::Micro => "Micro",
            Self::Nano => "Nano",
        }
    }

    /// Prefix of generated display names. Nano accounts read as plain users.
    #[must_use]
    pub const fn name_prefix(self) -> &'static str {
        match self {
            Self::Nano => "User",
            other => other.label(),
        }
    }
}

impl fmt::Display for InfluenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single account in the social graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    key: NodeKey,
    trust: f64,
    influence: f64,
    tier: InfluenceTier,
    supplied_name: Option<String>,
    display_name: String,
    state: InfectionState,
}

impl Node {
    pub(crate) fn new(key: NodeKey, trust: f64, supplied_name: Option<String>) -> Self {
        let display_name = supplied_name
            .clone()
            .unwrap_or_else(|| format!("{}-{key}", InfluenceTier::Nano.name_prefix()));
        Self {
            key,
            trust,
            influence: 0.0,
            tier: InfluenceTier::Nano,
            supplied_name,
            display_name,
            state: InfectionState::Susceptible,
        }
    }

    /// External identifier.
    #[must_use]
    pub const fn key(&self) -> &NodeKey {
        &self.key
    }

    /// Prior credibility in `[0, 1]`.
    #[must_use]
    pub const fn trust(&self) -> f64 {
        self.trust
    }

    /// Degree normalised by the maximum degree.
    #[must_use]
    pub const fn influence(&self) -> f64 {
        self.influence
    }

    /// Influence tier derived from [`Self::influence`].
    #[must_use]
    pub const fn tier(&self) -> InfluenceTier {
        self.tier
    }

    /// Name used in paths and leaderboards.
    #[must_use]
    pub const fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Current infection state.
    #[must_use]
    pub const fn state(&self) -> InfectionState {
        self.state
    }

    /// Whether the node is infected.
    #[must_use]
    pub const fn is_infected(&self) -> bool {
        matches!(self.state, InfectionState::Infected)
    }
}

/// Undirected social graph with per-node infection state.
///
/// # Examples
/// ```
/// use contagion_core::{Graph, NodeKey, InfectionState};
///
/// let mut graph = Graph::default();
/// let a = graph.add_node(NodeKey::Index(0), 0.5, None);
/// let b = graph.add_node(NodeKey::Index(1), 0.5, None);
/// assert!(graph.add_edge(a, b));
/// assert!(!graph.add_edge(b, a), "duplicate edges are idempotent");
/// graph.derive_features();
///
/// assert_eq!(graph.neighbors(a).collect::<Vec<_>>(), vec![b]);
/// graph.set_state(b, InfectionState::Infected);
/// assert_eq!(graph.infected_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
    adjacency: Vec<BTreeSet<NodeId>>,
    lookup: HashMap<NodeKey, NodeId>,
    edge_count: usize,
}

impl Graph {
    /// Adds a node and returns its arena id. Re-adding an existing key
    /// returns the existing id unchanged.
    pub fn add_node(&mut self, key: NodeKey, trust: f64, supplied_name: Option<String>) -> NodeId {
        if let Some(&existing) = self.lookup.get(&key) {
            return existing;
        }
        let id = NodeId::new(self.nodes.len());
        self.lookup.insert(key.clone(), id);
        self.nodes.push(Node::new(key, trust, supplied_name));
        self.adjacency.push(BTreeSet::new());
        id
    }

    /// Adds an undirected edge.
    ///
    /// Returns `false` without mutating the graph when the edge already
    /// exists, is a self-loop, or references an id outside the arena.
    pub fn add_edge(&mut self, left: NodeId, right: NodeId) -> bool {
        if left == right || left.get() >= self.nodes.len() || right.get() >= self.nodes.len() {
            return false;
        }
        let inserted = self
            .adjacency
            .get_mut(left.get())
            .is_some_and(|set| set.insert(right));
        if inserted {
            if let Some(set) = self.adjacency.get_mut(right.get()) {
                set.insert(left);
            }
            self.edge_count += 1;
        }
        inserted
    }

    /// Number of nodes.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node record.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.get())
    }

    /// Resolves an external key to its arena id.
    #[must_use]
    pub fn find(&self, key: &NodeKey) -> Option<NodeId> {
        self.lookup.get(key).copied()
    }

    /// Iterates over all node ids in arena order.
    pub fn node_ids(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// Iterates over `(id, node)` pairs in arena order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::new(index), node))
    }

    /// Iterates over each undirected edge once, as `(smaller, larger)`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(index, neighbours)| {
                let source = NodeId::new(index);
                neighbours
                    .iter()
                    .filter(move |&&target| target > source)
                    .map(move |&target| (source, target))
            })
    }

    /// Neighbours of `id` in ascending id order. Unknown ids have none.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency
            .get(id.get())
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Degree of `id`, zero for unknown ids.
    #[must_use]
    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency.get(id.get()).map_or(0, BTreeSet::len)
    }

    /// Current infection state of `id`, if it exists.
    #[must_use]
    pub fn state(&self, id: NodeId) -> Option<InfectionState> {
        self.node(id).map(Node::state)
    }

    /// Sets the infection state of `id`.
    ///
    /// This is the single mutation point for infection state. Infection is
    /// monotonic: a request to move an infected node back to
    /// [`InfectionState::Susceptible`] is ignored and reported as `false`.
    pub fn set_state(&mut self, id: NodeId, state: InfectionState) -> bool {
        let Some(node) = self.nodes.get_mut(id.get()) else {
            return false;
        };
        if node.state == InfectionState::Infected && state == InfectionState::Susceptible {
            return false;
        }
        node.state = state;
        true
    }

    /// Ids of all infected nodes in ascending order.
    #[must_use]
    pub fn infected(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.is_infected())
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of infected nodes.
    #[must_use]
    pub fn infected_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_infected()).count()
    }

    /// Display name of `id`, falling back to `Node-<index>` for unknown ids.
    #[must_use]
    pub fn display_name(&self, id: NodeId) -> String {
        self.node(id).map_or_else(
            || format!("Node-{}", id.get()),
            |node| node.display_name.clone(),
        )
    }

    /// Recomputes influence, tier and derived display names from current degree.
    ///
    /// Influence is degree over maximum degree, or zero when the graph has a
    /// single node or no edges. Previously derived values are never consulted.
    /// Names supplied at import time are preserved.
    #[expect(
        clippy::cast_precision_loss,
        reason = "degrees are far below 2^52, so the ratio is exact enough"
    )]
    pub fn derive_features(&mut self) {
        let degrees: Vec<usize> = self.adjacency.iter().map(BTreeSet::len).collect();
        let max_degree = degrees.iter().copied().max().unwrap_or(0);
        let normalise = self.nodes.len() > 1 && max_degree > 0;

        for (node, degree) in self.nodes.iter_mut().zip(degrees) {
            node.influence = if normalise {
                degree as f64 / max_degree as f64
            } else {
                0.0
            };
            node.tier = InfluenceTier::from_influence(node.influence);
            node.display_name = node.supplied_name.as_ref().map_or_else(
                || format!("{}-{}", node.tier.name_prefix(), node.key),
                Clone::clone,
            );
        }
    }

    /// Snapshot of the graph in the transport/report shape.
    #[must_use]
    pub fn topology(&self) -> GraphTopology {
        let nodes = self
            .nodes
            .iter()
            .map(|node| TopologyNode {
                id: node.key.clone(),
                name: node.display_name.clone(),
                trust: node.trust,
                influence: node.influence,
                tier: node.tier,
                state: node.state,
            })
            .collect();
        let links = self
            .edges()
            .filter_map(|(source, target)| {
                Some(TopologyLink {
                    source: self.node(source)?.key.clone(),
                    target: self.node(target)?.key.clone(),
                })
            })
            .collect();
        GraphTopology { nodes, links }
    }
}

/// Node entry of a [`GraphTopology`] snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopologyNode {
    /// External identifier.
    pub id: NodeKey,
    /// Display name.
    pub name: String,
    /// Prior credibility.
    pub trust: f64,
    /// Normalised degree.
    pub influence: f64,
    /// Influence tier.
    pub tier: InfluenceTier,
    /// Infection state at snapshot time.
    pub state: InfectionState,
}

/// Edge entry of a [`GraphTopology`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopologyLink {
    /// Smaller endpoint.
    pub source: NodeKey,
    /// Larger endpoint.
    pub target: NodeKey,
}

/// Node/link listing of a graph, as consumed by transports and reports.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphTopology {
    /// Nodes in arena order.
    pub nodes: Vec<TopologyNode>,
    /// Each undirected edge once.
    pub links: Vec<TopologyLink>,
}
