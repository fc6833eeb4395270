//! Outcome of repairing a single field

/// What happened to a field during normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRepair {
    /// Already canonical (or empty); written back untouched
    Unchanged,
    /// Rewritten into canonical form
    Repaired(String),
    /// Could not be repaired; the original value is forwarded for the loader to judge
    PassThrough {
        /// Why the repair failed
        reason: String,
    },
}

impl FieldRepair {
    /// Build a pass-through outcome
    pub fn pass_through(reason: impl Into<String>) -> Self {
        Self::PassThrough { reason: reason.into() }
    }

    /// Whether the field is still malformed after the repair attempt
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::PassThrough { .. })
    }

    /// The value to write back, given the original one
    pub fn resolve(self, original: String) -> String {
        match self {
            Self::Repaired(value) => value,
            Self::Unchanged | Self::PassThrough { .. } => original,
        }
    }
}
