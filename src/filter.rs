//! Projection filters: which components and attributes to keep in an output dataset.
//!
//! A caller hands in a [`FilterSpec`] in one of several shorthand shapes.
//! [`normalize_filter`] turns it into the canonical [`DataFilter`] mapping and validates that
//! mapping against the schema with [`validate_filter`].

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::error::FilterError;
use crate::schema::SchemaLookup;
use crate::token::{ComponentType, DatasetType};

/// What to keep of one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeFilter {
    /// Keep the component's storage as-is, shared with the source.
    Unrestricted,
    /// Copy every attribute.
    All,
    /// Copy the named attributes. An empty list keeps the component with no attributes.
    Only(Vec<String>),
}

impl AttributeFilter {
    /// Keep exactly `attributes`.
    pub fn only<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeFilter::Only(attributes.into_iter().map(Into::into).collect())
    }

    /// Keep no attributes.
    pub fn none() -> Self {
        AttributeFilter::Only(Vec::new())
    }
}

/// A projection filter as supplied by a caller, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterSpec {
    /// No filter: every available component with all attributes.
    #[default]
    None,
    /// Every available component with all attributes.
    All,
    /// The listed components, unrestricted.
    Components(Vec<ComponentType>),
    /// An explicit per-component mapping.
    Mapping(Vec<(ComponentType, AttributeFilter)>),
}

impl FilterSpec {
    /// Keep only the listed components, unrestricted.
    pub fn components<I, C>(components: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ComponentType>,
    {
        FilterSpec::Components(components.into_iter().map(Into::into).collect())
    }

    /// An explicit per-component mapping.
    pub fn mapping<I, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, AttributeFilter)>,
        C: Into<ComponentType>,
    {
        FilterSpec::Mapping(entries.into_iter().map(|(c, a)| (c.into(), a)).collect())
    }
}

/// A normalized, validated filter: one entry per component to keep, in filter order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataFilter {
    entries: Vec<(ComponentType, AttributeFilter)>,
}

impl DataFilter {
    /// The filter for `component`, if it is kept.
    pub fn get(&self, component: &str) -> Option<&AttributeFilter> {
        self.entries
            .iter()
            .find(|(c, _)| c.as_str() == component)
            .map(|(_, filter)| filter)
    }

    /// Iterate kept components in filter order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&ComponentType, &AttributeFilter)> {
        self.entries.iter().map(|(c, f)| (c, f))
    }

    /// Number of kept components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no component is kept.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalize `spec` against the components available in the model and validate the result.
///
/// - [`FilterSpec::None`] and [`FilterSpec::All`] keep every available component with
///   [`AttributeFilter::All`].
/// - [`FilterSpec::Components`] keeps each listed component [`AttributeFilter::Unrestricted`];
///   repeated components are kept once.
/// - [`FilterSpec::Mapping`] is kept as given, with repeated attribute names collapsed.
///
/// # Errors
/// Returns [`FilterError::InvalidShape`] if a mapping names a component twice, and
/// [`FilterError::Unknown`] if the filter names components or attributes the schema does not
/// know for `dataset_type`.
pub fn normalize_filter<S>(
    spec: &FilterSpec,
    dataset_type: DatasetType,
    available_components: &[ComponentType],
    schema: &S,
) -> Result<DataFilter, FilterError>
where
    S: SchemaLookup + ?Sized,
{
    let entries = match spec {
        FilterSpec::None | FilterSpec::All => available_components
            .iter()
            .map(|c| (c.clone(), AttributeFilter::All))
            .collect(),
        FilterSpec::Components(components) => {
            let mut seen = HashSet::with_capacity(components.len());
            components
                .iter()
                .filter(|c| seen.insert(*c))
                .map(|c| (c.clone(), AttributeFilter::Unrestricted))
                .collect()
        }
        FilterSpec::Mapping(entries) => {
            let mut seen = HashSet::with_capacity(entries.len());
            let mut normalized = Vec::with_capacity(entries.len());
            for (component, filter) in entries {
                if !seen.insert(component) {
                    return Err(FilterError::invalid_shape(format!(
                        "component '{component}' appears more than once"
                    )));
                }
                normalized.push((component.clone(), dedup_attributes(filter)));
            }
            normalized
        }
    };

    let filter = DataFilter { entries };
    validate_filter(&filter, dataset_type, schema)?;
    debug!(
        dataset_type = %dataset_type,
        components = filter.len(),
        "normalized data filter"
    );
    Ok(filter)
}

fn dedup_attributes(filter: &AttributeFilter) -> AttributeFilter {
    match filter {
        AttributeFilter::Only(attributes) => {
            let mut seen = HashSet::with_capacity(attributes.len());
            AttributeFilter::Only(
                attributes
                    .iter()
                    .filter(|a| seen.insert(a.as_str()))
                    .cloned()
                    .collect(),
            )
        }
        other => other.clone(),
    }
}

/// Check every component and attribute named by `filter` against the schema.
///
/// All names are checked before failing, so one error reports every unknown component and,
/// per known component, every unknown attribute.
///
/// # Errors
/// Returns [`FilterError::Unknown`] if anything is unknown.
pub fn validate_filter<S>(
    filter: &DataFilter,
    dataset_type: DatasetType,
    schema: &S,
) -> Result<(), FilterError>
where
    S: SchemaLookup + ?Sized,
{
    let mut unknown_components = Vec::new();
    let mut unknown_attributes = BTreeMap::new();

    for (component, attribute_filter) in filter.iter() {
        let Some(fields) = schema.attributes(dataset_type, component) else {
            unknown_components.push(component.clone());
            continue;
        };
        let AttributeFilter::Only(attributes) = attribute_filter else {
            continue;
        };
        let unknown: Vec<String> = attributes
            .iter()
            .filter(|a| fields.find(a).is_none())
            .cloned()
            .collect();
        if !unknown.is_empty() {
            unknown_attributes.insert(component.clone(), unknown);
        }
    }

    if unknown_components.is_empty() && unknown_attributes.is_empty() {
        return Ok(());
    }
    Err(FilterError::Unknown {
        components: unknown_components,
        attributes: unknown_attributes,
    })
}

#[cfg(feature = "serde")]
mod json {
    use serde_json::Value;

    use super::{AttributeFilter, FilterSpec};
    use crate::error::FilterError;
    use crate::token::ComponentType;

    /// Marker accepted in place of "all attributes" / "all components".
    const ALL_MARKER: &str = "...";

    impl TryFrom<&Value> for FilterSpec {
        type Error = FilterError;

        /// Parse a host-supplied filter:
        ///
        /// - `null` → [`FilterSpec::None`]
        /// - `"..."` → [`FilterSpec::All`]
        /// - `["node", "line"]` → [`FilterSpec::Components`]
        /// - `{"node": null, "line": "...", "source": ["i"]}` → [`FilterSpec::Mapping`]
        fn try_from(value: &Value) -> Result<Self, Self::Error> {
            match value {
                Value::Null => Ok(FilterSpec::None),
                Value::String(s) if s == ALL_MARKER => Ok(FilterSpec::All),
                Value::Array(items) => Ok(FilterSpec::Components(
                    names(items, value)?.into_iter().map(ComponentType::from).collect(),
                )),
                Value::Object(entries) => entries
                    .iter()
                    .map(|(component, attributes)| {
                        let filter = match attributes {
                            Value::Null => AttributeFilter::Unrestricted,
                            Value::String(s) if s == ALL_MARKER => AttributeFilter::All,
                            Value::Array(items) => AttributeFilter::Only(names(items, value)?),
                            _ => return Err(invalid(value)),
                        };
                        Ok((ComponentType::from(component.clone()), filter))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(FilterSpec::Mapping),
                _ => Err(invalid(value)),
            }
        }
    }

    impl TryFrom<Value> for FilterSpec {
        type Error = FilterError;

        fn try_from(value: Value) -> Result<Self, Self::Error> {
            FilterSpec::try_from(&value)
        }
    }

    fn names(items: &[Value], whole: &Value) -> Result<Vec<String>, FilterError> {
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(invalid(whole)),
            })
            .collect()
    }

    fn invalid(value: &Value) -> FilterError {
        FilterError::invalid_shape(value.to_string())
    }
}
