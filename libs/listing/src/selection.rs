//! Categorical selections.
//!
//! Every filterable field is a closed enumeration implementing
//! [`Categorical`]. A [`Selection`] is either the `all` sentinel or one
//! concrete variant, parsed once at the boundary where operator input arrives.

use crate::error::{ParseSelectionError, Result};

/// A closed set of values for one filterable field.
pub trait Categorical: Copy + PartialEq + Sized + 'static {
    /// Field name used in diagnostics (e.g. `"role"`).
    const FIELD: &'static str;

    /// All variants in display order.
    const VARIANTS: &'static [Self];

    /// Wire/CLI name of the variant.
    fn as_str(&self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(name))
    }
}

/// Selected value for one categorical filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: Categorical> Selection<T> {
    /// Parse operator input; empty input and `all` both mean no filter.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        T::from_name(trimmed)
            .map(Self::Only)
            .ok_or_else(|| ParseSelectionError::UnknownValue {
                field: T::FIELD,
                value: trimmed.to_string(),
                expected: T::VARIANTS
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Exact-match test against a record's field value.
    ///
    /// A record with no value never matches a concrete selection.
    pub fn admits(&self, value: Option<T>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => value == Some(*wanted),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(v) => v.as_str(),
        }
    }
}
