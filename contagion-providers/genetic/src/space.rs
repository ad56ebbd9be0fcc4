//! Gene bounds and the candidate encoding.

use contagion_core::{SUPPRESSION_RANGE, TunedParameters};
use rand::Rng;

/// Number of genes per candidate.
pub const GENE_COUNT: usize = 3;

/// A candidate as raw genes: `[risk_weight, trust_weight, suppression]`.
pub type Genome = [f64; GENE_COUNT];

/// Inclusive range a single gene may take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneBounds {
    /// Smallest allowed value.
    pub min: f64,
    /// Largest allowed value.
    pub max: f64,
}

impl GeneBounds {
    /// Range `[min, max]`.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether the bounds are finite and ordered.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Whether `value` lies in the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub(crate) fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Search space of the three tuned parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneSpace {
    /// Bounds of the risk weight gene.
    pub risk_weight: GeneBounds,
    /// Bounds of the trust weight gene.
    pub trust_weight: GeneBounds,
    /// Bounds of the suppression gene.
    pub suppression: GeneBounds,
}

impl Default for GeneSpace {
    fn default() -> Self {
        let (min, max) = SUPPRESSION_RANGE;
        Self {
            risk_weight: GeneBounds::new(0.1, 1.0),
            trust_weight: GeneBounds::new(0.1, 1.0),
            suppression: GeneBounds::new(min, max),
        }
    }
}

impl GeneSpace {
    pub(crate) const fn bounds(&self) -> [GeneBounds; GENE_COUNT] {
        [self.risk_weight, self.trust_weight, self.suppression]
    }

    /// Whether every gene range is valid and suppression stays inside
    /// [`SUPPRESSION_RANGE`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let (min, max) = SUPPRESSION_RANGE;
        self.bounds().iter().all(GeneBounds::is_valid)
            && self.suppression.min >= min
            && self.suppression.max <= max
    }

    /// Whether each gene of `genome` lies in its range.
    #[must_use]
    pub fn contains(&self, genome: &Genome) -> bool {
        self.bounds()
            .iter()
            .zip(genome)
            .all(|(bounds, &gene)| bounds.contains(gene))
    }

    pub(crate) fn sample<R: Rng>(&self, rng: &mut R) -> Genome {
        self.bounds().map(|bounds| bounds.sample(rng))
    }
}

/// Decodes a genome into tuned parameters.
#[must_use]
pub const fn decode(genome: &Genome) -> TunedParameters {
    let [risk_weight, trust_weight, suppression] = *genome;
    TunedParameters {
        risk_weight,
        trust_weight,
        suppression,
    }
}
