//! Error types for dataset conversion and column projection.

use std::collections::BTreeMap;
use std::fmt;

use arrow_schema::DataType;
use thiserror::Error;

use crate::token::ComponentType;

/// Errors raised while inspecting, splitting or converting datasets.
#[derive(Debug, Clone, Error)]
pub enum DatasetError {
    /// A component value does not have the expected Arrow shape.
    #[error("invalid data type {actual} in batch data for '{component}' (expected {expected})")]
    TypeMismatch {
        /// Component owning the offending value.
        component: ComponentType,
        /// Human-readable description of the accepted shapes.
        expected: &'static str,
        /// Arrow type actually found.
        actual: DataType,
    },

    /// Data is present but violates a structural invariant (rank, CSR offsets, ...).
    #[error("{}{message}", component.as_ref().map(|c| format!("invalid batch data for '{c}': ")).unwrap_or_default())]
    FormatViolation {
        /// Component owning the offending value, when known.
        component: Option<ComponentType>,
        /// The violated invariant.
        message: String,
    },

    /// Components disagree on the number of batches.
    #[error(
        "inconsistent number of batches in batch data: component '{component}' contains {batches} batches, while {} contained {checked_batches} batches",
        checked_list(checked)
    )]
    BatchSizeMismatch {
        /// Component whose batch count disagreed.
        component: ComponentType,
        /// Its batch count.
        batches: usize,
        /// Components checked before it, all sharing `checked_batches`.
        checked: Vec<ComponentType>,
        /// Batch count shared by the checked components.
        checked_batches: usize,
    },

    /// Batch-shaped and single-shaped components appear in the same dataset.
    #[error(
        "mixed {}batch data with {}batch data ({component})",
        if *batch { "" } else { "non-" },
        if *batch { "non-" } else { "" }
    )]
    MixedBatch {
        /// First component whose shape disagreed with the ones before it.
        component: ComponentType,
        /// Whether the components before it were batch-shaped.
        batch: bool,
    },

    /// A value kind with no registered missing-value sentinel.
    #[error("no missing-value sentinel is defined for values of type {data_type}")]
    UnsupportedValueKind {
        /// The unsupported Arrow type.
        data_type: DataType,
    },
}

impl DatasetError {
    /// Create a format violation attributed to `component`.
    pub fn format(component: &ComponentType, message: impl Into<String>) -> Self {
        Self::FormatViolation {
            component: Some(component.clone()),
            message: message.into(),
        }
    }

    /// Create a format violation not tied to a single component.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::FormatViolation {
            component: None,
            message: message.into(),
        }
    }

    /// Create a type mismatch for `component`.
    pub fn type_mismatch(
        component: &ComponentType,
        expected: &'static str,
        actual: &DataType,
    ) -> Self {
        Self::TypeMismatch {
            component: component.clone(),
            expected,
            actual: actual.clone(),
        }
    }
}

fn checked_list(checked: &[ComponentType]) -> String {
    match checked {
        [single] => format!("'{single}'"),
        many => {
            let mut names: Vec<&str> = many.iter().map(ComponentType::as_str).collect();
            names.sort_unstable();
            names.join("/")
        }
    }
}

/// Errors raised while normalizing, validating or applying a projection filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The raw filter is not one of the accepted shapes.
    #[error("invalid filter provided: {message}")]
    InvalidShape {
        /// Description of the offending shape.
        message: String,
    },

    /// The filter names components or attributes unknown to the schema.
    #[error("{}", UnknownNames { components, attributes })]
    Unknown {
        /// Unknown component types, in filter order.
        components: Vec<ComponentType>,
        /// Unknown attribute names per known component.
        attributes: BTreeMap<ComponentType, Vec<String>>,
    },

    /// A requested component is not present in the source dataset.
    #[error("component '{component}' is not present in the output data")]
    MissingComponent {
        /// The missing component.
        component: ComponentType,
    },

    /// A requested attribute is not present on the source component.
    #[error("attribute '{attribute}' is not present on component '{component}' in the output data")]
    MissingAttribute {
        /// Component that was projected.
        component: ComponentType,
        /// The missing attribute.
        attribute: String,
    },

    /// Attributes were requested from storage that holds no 1D/2D structured array.
    #[error("component '{component}' does not hold a 1D/2D structured array")]
    UnsupportedStorage {
        /// Component that was projected.
        component: ComponentType,
    },
}

impl FilterError {
    /// Create an invalid-shape error.
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::InvalidShape {
            message: message.into(),
        }
    }
}

struct UnknownNames<'a> {
    components: &'a [ComponentType],
    attributes: &'a BTreeMap<ComponentType, Vec<String>>,
}

impl fmt::Display for UnknownNames<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if !self.components.is_empty() {
            let names: Vec<&str> = self.components.iter().map(ComponentType::as_str).collect();
            write!(f, "unknown component types: {names:?}")?;
            sep = "; ";
        }
        if !self.attributes.is_empty() {
            write!(f, "{sep}unknown attributes: {{")?;
            for (i, (component, names)) in self.attributes.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{component}: {names:?}")?;
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}
