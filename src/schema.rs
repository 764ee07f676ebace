//! Read-only schema lookup consumed by filter validation.

use std::collections::HashMap;

use arrow_schema::{Field, Fields};

use crate::token::{ComponentType, DatasetType};

/// Resolves the attribute layout of a component within a dataset type.
///
/// Implementations are injected by the caller; the crate keeps no global registry.
pub trait SchemaLookup {
    /// The ordered attribute descriptors of `component` in `dataset_type`, or `None` if the
    /// component is not part of that dataset type.
    fn attributes(&self, dataset_type: DatasetType, component: &ComponentType) -> Option<&Fields>;

    /// Whether `component` is part of `dataset_type`.
    fn contains_component(&self, dataset_type: DatasetType, component: &ComponentType) -> bool {
        self.attributes(dataset_type, component).is_some()
    }
}

impl<T: SchemaLookup + ?Sized> SchemaLookup for &T {
    fn attributes(&self, dataset_type: DatasetType, component: &ComponentType) -> Option<&Fields> {
        (**self).attributes(dataset_type, component)
    }
}

/// In-memory [`SchemaLookup`] populated by the caller.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    datasets: HashMap<DatasetType, HashMap<ComponentType, Fields>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the attributes of `component` in `dataset_type`.
    pub fn insert(
        &mut self,
        dataset_type: DatasetType,
        component: impl Into<ComponentType>,
        attributes: impl Into<Fields>,
    ) -> Option<Fields> {
        self.datasets
            .entry(dataset_type)
            .or_default()
            .insert(component.into(), attributes.into())
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_component(
        mut self,
        dataset_type: DatasetType,
        component: impl Into<ComponentType>,
        attributes: impl IntoIterator<Item = Field>,
    ) -> Self {
        let fields: Fields = attributes.into_iter().collect();
        self.insert(dataset_type, component, fields);
        self
    }

    /// Components registered for `dataset_type`, sorted by name.
    pub fn component_types(&self, dataset_type: DatasetType) -> Vec<ComponentType> {
        let mut components: Vec<ComponentType> = self
            .datasets
            .get(&dataset_type)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        components.sort();
        components
    }
}

impl SchemaLookup for SchemaRegistry {
    fn attributes(&self, dataset_type: DatasetType, component: &ComponentType) -> Option<&Fields> {
        self.datasets.get(&dataset_type)?.get(component)
    }
}
