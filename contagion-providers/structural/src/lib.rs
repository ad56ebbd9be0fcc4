//! Graph convolution oracle scoring per-node infection likelihood.
//!
//! A two-layer graph convolution over node features `[state, trust,
//! content_risk]`. Messages propagate through the self-loop augmented
//! adjacency with symmetric degree normalisation, so each node sees its own
//! features and those of its neighbours weighted by `1 / sqrt(d_i * d_j)`.

use contagion_core::{CollaboratorError, Graph, InfectionOracle, StructuralScores};
use ndarray::{Array1, Array2, Axis, aview1};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{debug, instrument};

/// Number of input features per node.
pub const FEATURE_COUNT: usize = 3;

/// Default hidden layer width.
pub const DEFAULT_HIDDEN_WIDTH: usize = 16;

/// Layer weights for [`GraphConvolutionOracle`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionWeights {
    input: Array2<f64>,
    input_bias: Array1<f64>,
    output: Array2<f64>,
    output_bias: f64,
}

/// Weight matrices whose shapes do not line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("weights of shape {input:?} / {input_bias} / {output:?} do not chain")]
pub struct WeightShapeError {
    input: (usize, usize),
    input_bias: usize,
    output: (usize, usize),
}

impl ConvolutionWeights {
    /// Assembles weights from explicit matrices.
    ///
    /// `input` must be `3 x h`, `input_bias` length `h` and `output` `h x 1`.
    ///
    /// # Errors
    /// Returns [`WeightShapeError`] when the shapes do not chain.
    pub fn new(
        input: Array2<f64>,
        input_bias: Array1<f64>,
        output: Array2<f64>,
        output_bias: f64,
    ) -> Result<Self, WeightShapeError> {
        let hidden = input.ncols();
        if input.nrows() != FEATURE_COUNT
            || input_bias.len() != hidden
            || output.nrows() != hidden
            || output.ncols() != 1
        {
            return Err(WeightShapeError {
                input: input.dim(),
                input_bias: input_bias.len(),
                output: output.dim(),
            });
        }
        Ok(Self {
            input,
            input_bias,
            output,
            output_bias,
        })
    }

    /// Deterministic Glorot-uniform weights with zero biases.
    #[must_use]
    pub fn seeded(seed: u64, hidden: usize) -> Self {
        let width = hidden.max(1);
        let mut rng = SmallRng::seed_from_u64(seed);
        let input = glorot(&mut rng, FEATURE_COUNT, width);
        let output = glorot(&mut rng, width, 1);
        Self {
            input,
            input_bias: Array1::zeros(width),
            output,
            output_bias: 0.0,
        }
    }

    /// Hidden layer width.
    #[must_use]
    pub fn hidden_width(&self) -> usize {
        self.input.ncols()
    }
}

#[expect(clippy::cast_precision_loss, reason = "layer widths are small")]
fn glorot(rng: &mut SmallRng, rows: usize, cols: usize) -> Array2<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-limit..=limit))
}

/// [`InfectionOracle`] backed by a fixed two-layer graph convolution.
///
/// # Examples
/// ```
/// use contagion_core::{Graph, InfectionOracle, NodeKey};
/// use contagion_providers_structural::GraphConvolutionOracle;
///
/// let mut graph = Graph::default();
/// let a = graph.add_node(NodeKey::Index(0), 0.5, None);
/// let b = graph.add_node(NodeKey::Index(1), 0.5, None);
/// graph.add_edge(a, b);
///
/// let oracle = GraphConvolutionOracle::new(7);
/// let scores = oracle.predict(&graph, 0.4).expect("prediction succeeds");
/// assert_eq!(scores.len(), 2);
/// assert!(scores.probability(a) > 0.0 && scores.probability(a) < 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConvolutionOracle {
    weights: ConvolutionWeights,
}

impl GraphConvolutionOracle {
    /// Oracle with seeded weights of the default hidden width.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::from_weights(ConvolutionWeights::seeded(seed, DEFAULT_HIDDEN_WIDTH))
    }

    /// Oracle using the provided weights.
    #[must_use]
    pub const fn from_weights(weights: ConvolutionWeights) -> Self {
        Self { weights }
    }

    /// The layer weights in use.
    #[must_use]
    pub const fn weights(&self) -> &ConvolutionWeights {
        &self.weights
    }

    fn forward(&self, graph: &Graph, content_risk: f64) -> Array1<f64> {
        let features = node_features(graph, content_risk);
        let scale = inverse_sqrt_degrees(graph);

        let support = features.dot(&self.weights.input) + &self.weights.input_bias;
        let hidden = propagate(graph, &scale, &support).mapv(|value| value.max(0.0));

        let logits = hidden.dot(&self.weights.output) + self.weights.output_bias;
        propagate(graph, &scale, &logits)
            .index_axis(Axis(1), 0)
            .mapv(sigmoid)
    }
}

impl InfectionOracle for GraphConvolutionOracle {
    fn name(&self) -> &str {
        "graph_convolution"
    }

    #[instrument(
        name = "structural.predict",
        skip_all,
        fields(nodes = graph.node_count(), edges = graph.edge_count()),
    )]
    fn predict(
        &self,
        graph: &Graph,
        content_risk: f64,
    ) -> Result<StructuralScores, CollaboratorError> {
        if graph.is_empty() {
            return Ok(StructuralScores::default());
        }
        let probabilities = self.forward(graph, content_risk);
        debug!(
            mean = probabilities.mean().unwrap_or_default(),
            "structural scores computed"
        );
        Ok(graph
            .node_ids()
            .zip(probabilities.iter().copied())
            .collect())
    }
}

fn node_features(graph: &Graph, content_risk: f64) -> Array2<f64> {
    let mut features = Array2::zeros((graph.node_count(), FEATURE_COUNT));
    for (id, node) in graph.nodes() {
        let values = [node.state().as_feature(), node.trust(), content_risk];
        features.row_mut(id.get()).assign(&aview1(&values));
    }
    features
}

/// `1 / sqrt(deg + 1)` per node, the self loop included.
#[expect(clippy::cast_precision_loss, reason = "degrees are far below 2^52")]
fn inverse_sqrt_degrees(graph: &Graph) -> Array1<f64> {
    graph
        .node_ids()
        .map(|id| 1.0 / ((graph.degree(id) + 1) as f64).sqrt())
        .collect()
}

/// Computes `D^-1/2 (A + I) D^-1/2 · values` from the adjacency lists.
fn propagate(graph: &Graph, scale: &Array1<f64>, values: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(values.raw_dim());
    for (id, &own_scale) in graph.node_ids().zip(scale) {
        let own = id.get();
        let mut row = out.row_mut(own);
        row.scaled_add(own_scale * own_scale, &values.row(own));
        for neighbour in graph.neighbors(id) {
            let other = neighbour.get();
            if let Some(&other_scale) = scale.get(other) {
                row.scaled_add(own_scale * other_scale, &values.row(other));
            }
        }
    }
    out
}

fn sigmoid(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}
