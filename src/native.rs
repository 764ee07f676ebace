//! Conversion of Arrow-backed datasets to plain host values.
//!
//! The native form keeps only what is set: attributes whose value is sentinel-missing
//! (see [`is_missing`]) are left out of each object. With the `serde` feature the native
//! types serialize as nested maps and sequences, e.g.
//! `{"node": [{"id": 1, "u_rated": 10500.0}], "line": [...]}`.

use arrow_array::{
    Array, StructArray,
    cast::AsArray,
    types::{Float64Type, Int8Type, Int32Type},
};
use arrow_schema::DataType;
use tracing::debug;

use crate::batch::split_batches;
use crate::error::DatasetError;
use crate::missing::is_missing;
use crate::storage::{ComponentStorage, Dataset};
use crate::token::ComponentType;

/// A plain attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Integer attribute (`i32` or `i8` columns).
    Int(i64),
    /// Floating-point attribute.
    Float(f64),
    /// Multi-valued attribute, e.g. one value per phase.
    List(Vec<NativeValue>),
}

impl From<i64> for NativeValue {
    fn from(v: i64) -> Self {
        NativeValue::Int(v)
    }
}

impl From<f64> for NativeValue {
    fn from(v: f64) -> Self {
        NativeValue::Float(v)
    }
}

/// One object: its set attributes in the component's declared field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeObject {
    attributes: Vec<(String, NativeValue)>,
}

impl NativeObject {
    /// Value of `attribute`, if it was set.
    pub fn get(&self, attribute: &str) -> Option<&NativeValue> {
        self.attributes
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, value)| value)
    }

    /// Attribute names in field order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(attribute, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NativeValue)> {
        self.attributes.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of set attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<K: Into<String>, V: Into<NativeValue>> FromIterator<(K, V)> for NativeObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            attributes: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Native form of a single dataset: objects per component, in dataset order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeSingleDataset {
    components: Vec<(ComponentType, Vec<NativeObject>)>,
}

impl NativeSingleDataset {
    /// Objects of `component`.
    pub fn get(&self, component: &str) -> Option<&[NativeObject]> {
        self.components
            .iter()
            .find(|(c, _)| c.as_str() == component)
            .map(|(_, objects)| objects.as_slice())
    }

    /// Iterate components in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = (&ComponentType, &[NativeObject])> {
        self.components.iter().map(|(c, objects)| (c, objects.as_slice()))
    }

    /// Component types in dataset order.
    pub fn component_types(&self) -> impl Iterator<Item = &ComponentType> {
        self.components.iter().map(|(c, _)| c)
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether there are no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Native form of a dataset of either shape.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeDataset {
    /// A single dataset.
    Single(NativeSingleDataset),
    /// One native dataset per batch.
    Batch(Vec<NativeSingleDataset>),
}

impl NativeDataset {
    /// The single dataset, if this is not a batch.
    pub fn as_single(&self) -> Option<&NativeSingleDataset> {
        match self {
            NativeDataset::Single(single) => Some(single),
            NativeDataset::Batch(_) => None,
        }
    }

    /// The per-batch datasets, if this is a batch.
    pub fn as_batch(&self) -> Option<&[NativeSingleDataset]> {
        match self {
            NativeDataset::Single(_) => None,
            NativeDataset::Batch(batches) => Some(batches),
        }
    }
}

/// Convert a dataset of either shape to its native form.
///
/// The dataset is a batch when every component is batch-shaped (a rank-2 dense array or a
/// sparse batch). It is then split per batch and each batch converted; otherwise it is
/// converted as a single dataset. An empty dataset is single.
///
/// # Errors
/// Returns [`DatasetError::MixedBatch`] when batch and single components are mixed, or any
/// error from splitting or single conversion.
pub fn dataset_to_native(dataset: &Dataset) -> Result<NativeDataset, DatasetError> {
    if is_batch_dataset(dataset)? {
        let batches = split_batches(dataset)?;
        debug!(batches = batches.len(), "converting batch dataset to native");
        let native = batches
            .iter()
            .map(single_dataset_to_native)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(NativeDataset::Batch(native));
    }
    single_dataset_to_native(dataset).map(NativeDataset::Single)
}

/// Whether every component of `dataset` is batch-shaped.
///
/// # Errors
/// Returns [`DatasetError::MixedBatch`] naming the first component whose shape disagrees with
/// the components before it.
pub fn is_batch_dataset(dataset: &Dataset) -> Result<bool, DatasetError> {
    let mut is_batch: Option<bool> = None;
    for (component, storage) in dataset.iter() {
        let component_batch = storage.is_batch();
        if let Some(batch) = is_batch.filter(|&batch| batch != component_batch) {
            return Err(DatasetError::MixedBatch {
                component: component.clone(),
                batch,
            });
        }
        is_batch = Some(component_batch);
    }
    Ok(is_batch.unwrap_or(false))
}

/// Convert a single dataset to its native form, leaving out missing attributes.
///
/// # Errors
/// Returns [`DatasetError::FormatViolation`] if any component is not a rank-1 struct array, or
/// [`DatasetError::UnsupportedValueKind`] for attribute types without a missing sentinel.
pub fn single_dataset_to_native(dataset: &Dataset) -> Result<NativeSingleDataset, DatasetError> {
    let mut tables = Vec::with_capacity(dataset.len());
    for (component, storage) in dataset.iter() {
        match storage {
            ComponentStorage::Dense(array) if matches!(array.data_type(), DataType::Struct(_)) => {
                tables.push((component, array.as_struct()));
            }
            _ => return Err(DatasetError::invalid_format("invalid data format")),
        }
    }

    let components = tables
        .into_iter()
        .map(|(component, objects)| Ok((component.clone(), objects_to_native(objects)?)))
        .collect::<Result<_, DatasetError>>()?;
    Ok(NativeSingleDataset { components })
}

fn objects_to_native(objects: &StructArray) -> Result<Vec<NativeObject>, DatasetError> {
    let mut native = vec![NativeObject::default(); objects.len()];
    for (field, column) in objects.fields().iter().zip(objects.columns()) {
        for (row, object) in native.iter_mut().enumerate() {
            let value = column.slice(row, 1);
            if is_missing(value.as_ref())? {
                continue;
            }
            object
                .attributes
                .push((field.name().clone(), native_value(value.as_ref(), 0)));
        }
    }
    Ok(native)
}

/// Value at `index` of a column whose kind has already been checked by [`is_missing`].
/// Null slots are reported as their kind's sentinel.
fn native_value(column: &dyn Array, index: usize) -> NativeValue {
    match column.data_type() {
        DataType::Float64 => {
            let values = column.as_primitive::<Float64Type>();
            NativeValue::Float(if values.is_null(index) {
                f64::NAN
            } else {
                values.value(index)
            })
        }
        DataType::Int32 => {
            let values = column.as_primitive::<Int32Type>();
            NativeValue::Int(if values.is_null(index) {
                i64::from(i32::MIN)
            } else {
                i64::from(values.value(index))
            })
        }
        DataType::Int8 => {
            let values = column.as_primitive::<Int8Type>();
            NativeValue::Int(if values.is_null(index) {
                i64::from(i8::MIN)
            } else {
                i64::from(values.value(index))
            })
        }
        DataType::FixedSizeList(_, _) => {
            let list = column.as_fixed_size_list();
            let items = list.value(index);
            NativeValue::List(
                (0..items.len())
                    .map(|i| native_value(items.as_ref(), i))
                    .collect(),
            )
        }
        other => unreachable!("value kind {other} passed the missing-value check"),
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use serde::ser::{Serialize, SerializeMap, Serializer};

    use super::{NativeDataset, NativeObject, NativeSingleDataset, NativeValue};

    impl Serialize for NativeValue {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                NativeValue::Int(v) => serializer.serialize_i64(*v),
                NativeValue::Float(v) => serializer.serialize_f64(*v),
                NativeValue::List(items) => items.serialize(serializer),
            }
        }
    }

    impl Serialize for NativeObject {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.attributes.len()))?;
            for (name, value) in &self.attributes {
                map.serialize_entry(name, value)?;
            }
            map.end()
        }
    }

    impl Serialize for NativeSingleDataset {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.components.len()))?;
            for (component, objects) in &self.components {
                map.serialize_entry(component, objects)?;
            }
            map.end()
        }
    }

    impl Serialize for NativeDataset {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                NativeDataset::Single(single) => single.serialize(serializer),
                NativeDataset::Batch(batches) => batches.serialize(serializer),
            }
        }
    }
}
