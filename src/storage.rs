//! Component storage layouts and the dataset container.
//!
//! A component's objects live in an Arrow [`StructArray`](arrow_array::StructArray) whose
//! fields are the component's attributes. Batches are expressed either densely, as a
//! `FixedSizeList<Struct>` with one list slot per batch, or sparsely, as a flat struct
//! array plus CSR offsets ([`SparseBatch`]).

use std::sync::Arc;

use arrow_array::{Array, ArrayRef, FixedSizeListArray, StructArray};
use arrow_buffer::ScalarBuffer;
use arrow_schema::{DataType, Field};

use crate::token::ComponentType;

/// Storage of one component within a dataset.
#[derive(Debug, Clone)]
pub enum ComponentStorage {
    /// A rank-1 struct array (one table) or a rank-2 `FixedSizeList<Struct>` (one table per
    /// batch, same object count in every batch).
    Dense(ArrayRef),
    /// Variable object counts per batch over one shared struct array.
    Sparse(SparseBatch),
}

impl ComponentStorage {
    /// Wrap a single table.
    pub fn single(objects: StructArray) -> Self {
        Self::Dense(Arc::new(objects))
    }

    /// Lay out `objects` as a dense batch of `objects.len() / objects_per_batch` rows.
    ///
    /// A batch count cannot be derived from zero objects per batch; build a `FixedSizeListArray`
    /// of size 0 with an explicit length and wrap it in [`ComponentStorage::Dense`] instead.
    ///
    /// # Panics
    /// Panics if `objects_per_batch` is zero, does not divide `objects.len()` or does not fit an
    /// `i32`.
    pub fn dense(objects: StructArray, objects_per_batch: usize) -> Self {
        assert!(objects_per_batch > 0, "objects per batch must be non-zero");
        let item = Arc::new(Field::new(
            "item",
            DataType::Struct(objects.fields().clone()),
            true,
        ));
        let size = i32::try_from(objects_per_batch).expect("objects per batch fits i32");
        Self::Dense(Arc::new(FixedSizeListArray::new(
            item,
            size,
            Arc::new(objects),
            None,
        )))
    }

    /// Lay out `objects` as a sparse batch with the given offsets.
    pub fn sparse(objects: StructArray, indptr: impl Into<ScalarBuffer<i64>>) -> Self {
        Self::Sparse(SparseBatch::new(indptr, Arc::new(objects)))
    }

    /// Whether this storage is batch-shaped: sparse, or dense with rank 2.
    ///
    /// Dense values of any other rank count as single.
    pub fn is_batch(&self) -> bool {
        match self {
            ComponentStorage::Dense(array) => rank(array.data_type()) == 2,
            ComponentStorage::Sparse(_) => true,
        }
    }

    /// The attribute descriptors of the stored objects, if the innermost value is a struct.
    pub fn attributes(&self) -> Option<&arrow_schema::Fields> {
        let data_type = match self {
            ComponentStorage::Dense(array) => array.data_type(),
            ComponentStorage::Sparse(sparse) => sparse.data.data_type(),
        };
        match innermost(data_type) {
            DataType::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<StructArray> for ComponentStorage {
    fn from(objects: StructArray) -> Self {
        Self::single(objects)
    }
}

impl From<SparseBatch> for ComponentStorage {
    fn from(sparse: SparseBatch) -> Self {
        Self::Sparse(sparse)
    }
}

/// CSR-like batch layout: batch `i` is `data[indptr[i]..indptr[i + 1]]`.
#[derive(Debug, Clone)]
pub struct SparseBatch {
    /// Offsets into `data`, one more than the number of batches.
    pub indptr: ScalarBuffer<i64>,
    /// All objects of all batches, concatenated.
    pub data: ArrayRef,
}

impl SparseBatch {
    /// Construct without validating the offsets; see [`SparseBatch::validate`].
    pub fn new(indptr: impl Into<ScalarBuffer<i64>>, data: ArrayRef) -> Self {
        Self {
            indptr: indptr.into(),
            data,
        }
    }

    /// Number of batches described by the offsets, `None` when `indptr` is empty.
    pub fn num_batches(&self) -> Option<usize> {
        self.indptr.len().checked_sub(1)
    }

    /// Check the CSR invariants: `indptr` starts at 0, ends at `data.len()` and never decreases.
    ///
    /// Returns the violated invariant on failure.
    pub fn validate(&self) -> Result<(), String> {
        let (Some(&first), Some(&last)) = (self.indptr.first(), self.indptr.last()) else {
            return Err("indptr must contain at least one offset".to_string());
        };
        let len = self.data.len();
        let monotonic = self.indptr.windows(2).all(|w| w[0] <= w[1]);
        if first != 0 || usize::try_from(last).ok() != Some(len) || !monotonic {
            return Err(format!(
                "invalid indptr (should start with 0, end with the number of objects ({len}) \
                 and be monotonic increasing)"
            ));
        }
        Ok(())
    }

    /// The objects of batch `index`. Offsets must have been validated.
    pub(crate) fn batch(&self, index: usize) -> ArrayRef {
        let start = self.indptr[index] as usize;
        let end = self.indptr[index + 1] as usize;
        self.data.slice(start, end - start)
    }
}

/// Rank of a dense value: `FixedSizeList` nesting depth plus one.
pub fn rank(data_type: &DataType) -> usize {
    match data_type {
        DataType::FixedSizeList(item, _) => 1 + rank(item.data_type()),
        _ => 1,
    }
}

pub(crate) fn innermost(data_type: &DataType) -> &DataType {
    match data_type {
        DataType::FixedSizeList(item, _) => innermost(item.data_type()),
        other => other,
    }
}

/// An ordered mapping from component type to its storage.
///
/// Insertion order is kept and is the order every conversion iterates in.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    components: Vec<(ComponentType, ComponentStorage)>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a component, returning the previous storage.
    ///
    /// A replaced component keeps its original position.
    pub fn insert(
        &mut self,
        component: impl Into<ComponentType>,
        storage: impl Into<ComponentStorage>,
    ) -> Option<ComponentStorage> {
        let component = component.into();
        let storage = storage.into();
        match self.components.iter_mut().find(|(c, _)| *c == component) {
            Some((_, slot)) => Some(std::mem::replace(slot, storage)),
            None => {
                self.components.push((component, storage));
                None
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_component(
        mut self,
        component: impl Into<ComponentType>,
        storage: impl Into<ComponentStorage>,
    ) -> Self {
        self.insert(component, storage);
        self
    }

    /// Storage of `component`.
    pub fn get(&self, component: &str) -> Option<&ComponentStorage> {
        self.components
            .iter()
            .find(|(c, _)| c.as_str() == component)
            .map(|(_, storage)| storage)
    }

    /// Whether `component` is present.
    pub fn contains(&self, component: &str) -> bool {
        self.get(component).is_some()
    }

    /// Iterate components in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&ComponentType, &ComponentStorage)> {
        self.components.iter().map(|(c, s)| (c, s))
    }

    /// Component types in insertion order.
    pub fn component_types(&self) -> impl ExactSizeIterator<Item = &ComponentType> {
        self.components.iter().map(|(c, _)| c)
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the dataset has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl<C, S> FromIterator<(C, S)> for Dataset
where
    C: Into<ComponentType>,
    S: Into<ComponentStorage>,
{
    fn from_iter<I: IntoIterator<Item = (C, S)>>(iter: I) -> Self {
        let mut dataset = Dataset::new();
        for (component, storage) in iter {
            dataset.insert(component, storage);
        }
        dataset
    }
}
