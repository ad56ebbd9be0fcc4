//! Error types for the contagion core library.
//!
//! Configuration problems surface before any stepping begins. Collaborator
//! failures on run-scoped calls are fatal to the run; the per-step structural
//! oracle degrades instead of erroring.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::engine::RunPhase;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// A failure reported by an external collaborator (oracle or tuner).
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or was not wired into the process.
    #[error("collaborator unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause.
        reason: Arc<str>,
    },
    /// The collaborator answered with a response that could not be interpreted.
    #[error("collaborator returned a malformed response: {reason}")]
    Malformed {
        /// Human-readable cause.
        reason: Arc<str>,
    },
    /// A returned value fell outside its contractual range.
    #[error("{field} = {value} lies outside [{min}, {max}]")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was returned.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
}

impl CollaboratorError {
    /// Builds an [`CollaboratorError::Unavailable`] from any displayable reason.
    #[must_use]
    pub fn unavailable(reason: impl fmt::Display) -> Self {
        Self::Unavailable {
            reason: Arc::from(reason.to_string()),
        }
    }

    /// Builds a [`CollaboratorError::Malformed`] from any displayable reason.
    #[must_use]
    pub fn malformed(reason: impl fmt::Display) -> Self {
        Self::Malformed {
            reason: Arc::from(reason.to_string()),
        }
    }
}

define_error_codes! {
    /// Stable codes describing [`CollaboratorError`] variants.
    enum CollaboratorErrorCode for CollaboratorError {
        /// The collaborator could not be reached.
        Unavailable => Unavailable { .. } => "COLLABORATOR_UNAVAILABLE",
        /// The collaborator response could not be interpreted.
        Malformed => Malformed { .. } => "COLLABORATOR_MALFORMED",
        /// A returned value fell outside its contractual range.
        OutOfRange => OutOfRange { .. } => "COLLABORATOR_OUT_OF_RANGE",
    }
}

/// Error type produced when configuring or running a simulation.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ContagionError {
    /// The requested number of seed nodes was negative.
    #[error("seed_nodes must not be negative (got {got})")]
    NegativeSeedCount {
        /// The value supplied by the caller.
        got: i64,
    },
    /// The requested number of generated nodes was negative.
    #[error("num_nodes must not be negative (got {got})")]
    NegativeNodeCount {
        /// The value supplied by the caller.
        got: i64,
    },
    /// A generated graph ended up with no nodes while seeds were requested.
    #[error("graph has no nodes but {seeds} seed nodes were requested")]
    EmptyGraph {
        /// Number of seeds requested.
        seeds: usize,
    },
    /// An imported graph declared the same node id more than once.
    #[error("imported graph declares node `{id}` more than once")]
    DuplicateNode {
        /// The repeated identifier.
        id: Arc<str>,
    },
    /// An imported node carried a trust value outside `[0, 1]`.
    #[error("node `{id}` has trust {trust}, expected a finite value in [0, 1]")]
    InvalidTrust {
        /// Identifier of the offending node.
        id: Arc<str>,
        /// The rejected trust value.
        trust: f64,
    },
    /// Graph generation parameters were unusable.
    #[error("invalid generation parameters: {reason}")]
    InvalidGenerationParams {
        /// Human-readable cause.
        reason: &'static str,
    },
    /// A run-scoped collaborator call failed.
    #[error("collaborator `{collaborator}` failed: {error}")]
    Collaborator {
        /// Name of the failing collaborator.
        collaborator: Arc<str>,
        #[source]
        /// Underlying collaborator failure.
        error: CollaboratorError,
    },
    /// A single-use run was driven out of order.
    #[error("operation requires phase {expected} but the run is in phase {actual}")]
    PhaseViolation {
        /// Phase the operation needs.
        expected: RunPhase,
        /// Phase the run was actually in.
        actual: RunPhase,
    },
}

define_error_codes! {
    /// Stable codes describing [`ContagionError`] variants.
    enum ContagionErrorCode for ContagionError {
        /// The requested number of seed nodes was negative.
        NegativeSeedCount => NegativeSeedCount { .. } => "CONTAGION_NEGATIVE_SEED_COUNT",
        /// The requested number of generated nodes was negative.
        NegativeNodeCount => NegativeNodeCount { .. } => "CONTAGION_NEGATIVE_NODE_COUNT",
        /// A generated graph had no nodes while seeds were requested.
        EmptyGraph => EmptyGraph { .. } => "CONTAGION_EMPTY_GRAPH",
        /// An imported graph repeated a node id.
        DuplicateNode => DuplicateNode { .. } => "CONTAGION_DUPLICATE_NODE",
        /// An imported node carried an invalid trust value.
        InvalidTrust => InvalidTrust { .. } => "CONTAGION_INVALID_TRUST",
        /// Graph generation parameters were unusable.
        InvalidGenerationParams => InvalidGenerationParams { .. } => "CONTAGION_INVALID_GENERATION_PARAMS",
        /// A run-scoped collaborator call failed.
        CollaboratorFailure => Collaborator { .. } => "CONTAGION_COLLABORATOR_FAILURE",
        /// A single-use run was driven out of order.
        PhaseViolation => PhaseViolation { .. } => "CONTAGION_PHASE_VIOLATION",
    }
}

impl ContagionError {
    /// Wraps a [`CollaboratorError`] with the name of the collaborator that raised it.
    #[must_use]
    pub fn collaborator(name: &str, error: CollaboratorError) -> Self {
        Self::Collaborator {
            collaborator: Arc::from(name),
            error,
        }
    }

    /// Retrieve the inner [`CollaboratorErrorCode`] when the error came from a collaborator.
    #[must_use]
    pub const fn collaborator_code(&self) -> Option<CollaboratorErrorCode> {
        match self {
            Self::Collaborator { error, .. } => Some(error.code()),
            _ => None,
        }
    }

    /// Returns `true` for errors caused by invalid run configuration or graph input.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NegativeSeedCount { .. }
                | Self::NegativeNodeCount { .. }
                | Self::EmptyGraph { .. }
                | Self::DuplicateNode { .. }
                | Self::InvalidTrust { .. }
                | Self::InvalidGenerationParams { .. }
        )
    }

    /// Returns `true` when a run-scoped collaborator call failed.
    #[must_use]
    pub const fn is_collaborator(&self) -> bool {
        matches!(self, Self::Collaborator { .. })
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, ContagionError>;
