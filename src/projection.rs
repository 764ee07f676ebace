//! Columnar projection of a computed output dataset.
//!
//! [`project_columnar`] keeps the components and attributes selected by a [`FilterSpec`].
//! Selected attributes are deep-copied into standalone columns, so the result does not
//! share buffers with the source.
//!
//! Components selected with [`AttributeFilter::Unrestricted`] are the exception: their
//! storage is shared with the source as-is. A caller that keeps writing into the source
//! buffers must not treat such a component as an independent copy.

use std::sync::Arc;

use arrow_array::{Array, ArrayRef, FixedSizeListArray, StructArray, cast::AsArray, make_array};
use arrow_buffer::ScalarBuffer;
use arrow_data::{ArrayData, transform::MutableArrayData};
use arrow_schema::{DataType, Field};
use tracing::{debug, trace};

use crate::error::FilterError;
use crate::filter::{AttributeFilter, FilterSpec, normalize_filter};
use crate::schema::SchemaLookup;
use crate::storage::{ComponentStorage, Dataset};
use crate::token::{ComponentType, DatasetType};

/// One component of a projected dataset.
#[derive(Debug, Clone)]
pub enum ProjectedComponent {
    /// The source storage, shared rather than copied.
    Shared(ComponentStorage),
    /// Copied attribute columns.
    Columns(ColumnSet),
}

impl ProjectedComponent {
    /// The shared storage, if the component was passed through.
    pub fn as_shared(&self) -> Option<&ComponentStorage> {
        match self {
            ProjectedComponent::Shared(storage) => Some(storage),
            ProjectedComponent::Columns(_) => None,
        }
    }

    /// The copied columns, if the component was projected.
    pub fn as_columns(&self) -> Option<&ColumnSet> {
        match self {
            ProjectedComponent::Shared(_) => None,
            ProjectedComponent::Columns(columns) => Some(columns),
        }
    }
}

/// Attribute columns of one component, in selection order.
///
/// Columns keep the batch layout of the source: a single table gives flat columns, a dense
/// batch gives `FixedSizeList` columns with one slot per batch, and a sparse batch gives flat
/// columns plus a copy of the batch offsets.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<(String, ArrayRef)>,
    indptr: Option<ScalarBuffer<i64>>,
}

impl ColumnSet {
    /// Column of `attribute`.
    pub fn get(&self, attribute: &str) -> Option<&ArrayRef> {
        self.columns
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, column)| column)
    }

    /// Attribute names in selection order.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(attribute, column)` pairs in selection order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &ArrayRef)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    /// Batch offsets, for components projected from a sparse batch.
    pub fn indptr(&self) -> Option<&ScalarBuffer<i64>> {
        self.indptr.as_ref()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no attribute was selected.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Result of [`project_columnar`]: the selected components in filter order.
#[derive(Debug, Clone, Default)]
pub struct ProjectedDataset {
    components: Vec<(ComponentType, ProjectedComponent)>,
}

impl ProjectedDataset {
    /// Projection of `component`.
    pub fn get(&self, component: &str) -> Option<&ProjectedComponent> {
        self.components
            .iter()
            .find(|(c, _)| c.as_str() == component)
            .map(|(_, projected)| projected)
    }

    /// Iterate components in filter order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&ComponentType, &ProjectedComponent)> {
        self.components.iter().map(|(c, p)| (c, p))
    }

    /// Component types in filter order.
    pub fn component_types(&self) -> impl ExactSizeIterator<Item = &ComponentType> {
        self.components.iter().map(|(c, _)| c)
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no component was selected.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Select components and attributes of `output` according to `spec`.
///
/// The filter is normalized and validated first (see [`normalize_filter`]). Then, per
/// selected component:
///
/// - [`AttributeFilter::Unrestricted`]: the source storage is shared;
/// - an empty [`AttributeFilter::Only`]: an empty column set;
/// - [`AttributeFilter::All`]: a copy of every attribute of the source storage;
/// - [`AttributeFilter::Only`]: a copy of the named attributes, in filter order.
///
/// # Errors
/// Returns any [`normalize_filter`] error, [`FilterError::MissingComponent`] when a selected
/// component is absent from `output`, [`FilterError::MissingAttribute`] when a named attribute
/// is absent from the source storage, and [`FilterError::UnsupportedStorage`] when attributes
/// are requested from storage that holds no structured array.
pub fn project_columnar<S>(
    output: &Dataset,
    spec: &FilterSpec,
    dataset_type: DatasetType,
    available_components: &[ComponentType],
    schema: &S,
) -> Result<ProjectedDataset, FilterError>
where
    S: SchemaLookup + ?Sized,
{
    let filter = normalize_filter(spec, dataset_type, available_components, schema)?;
    debug!(
        dataset_type = %dataset_type,
        components = filter.len(),
        "projecting output dataset"
    );

    let mut components = Vec::with_capacity(filter.len());
    for (component, attribute_filter) in filter.iter() {
        let storage = output
            .get(component.as_str())
            .ok_or_else(|| FilterError::MissingComponent {
                component: component.clone(),
            })?;
        let projected = match attribute_filter {
            AttributeFilter::Unrestricted => ProjectedComponent::Shared(storage.clone()),
            AttributeFilter::Only(attributes) if attributes.is_empty() => {
                ProjectedComponent::Columns(ColumnSet::default())
            }
            AttributeFilter::All => {
                let source = SourceColumns::new(component, storage)?;
                let names: Vec<String> =
                    source.objects.fields().iter().map(|f| f.name().clone()).collect();
                ProjectedComponent::Columns(source.copy(component, &names)?)
            }
            AttributeFilter::Only(attributes) => {
                let source = SourceColumns::new(component, storage)?;
                ProjectedComponent::Columns(source.copy(component, attributes)?)
            }
        };
        trace!(component = %component, "projected component");
        components.push((component.clone(), projected));
    }
    Ok(ProjectedDataset { components })
}

/// The struct array holding a component's objects, plus how to re-apply its batch layout.
struct SourceColumns<'a> {
    objects: &'a StructArray,
    layout: Layout<'a>,
}

enum Layout<'a> {
    Single,
    Dense(&'a FixedSizeListArray),
    Sparse(&'a ScalarBuffer<i64>),
}

impl<'a> SourceColumns<'a> {
    fn new(component: &ComponentType, storage: &'a ComponentStorage) -> Result<Self, FilterError> {
        let unsupported = || FilterError::UnsupportedStorage {
            component: component.clone(),
        };
        match storage {
            ComponentStorage::Dense(array) => match array.data_type() {
                DataType::Struct(_) => Ok(Self {
                    objects: array.as_struct(),
                    layout: Layout::Single,
                }),
                DataType::FixedSizeList(item, _)
                    if matches!(item.data_type(), DataType::Struct(_)) =>
                {
                    let list = array.as_fixed_size_list();
                    Ok(Self {
                        objects: list.values().as_struct(),
                        layout: Layout::Dense(list),
                    })
                }
                _ => Err(unsupported()),
            },
            ComponentStorage::Sparse(sparse) => match sparse.data.data_type() {
                DataType::Struct(_) => Ok(Self {
                    objects: sparse.data.as_struct(),
                    layout: Layout::Sparse(&sparse.indptr),
                }),
                _ => Err(unsupported()),
            },
        }
    }

    fn copy(
        &self,
        component: &ComponentType,
        attributes: &[String],
    ) -> Result<ColumnSet, FilterError> {
        let columns = attributes
            .iter()
            .map(|attribute| {
                let column = self.objects.column_by_name(attribute).ok_or_else(|| {
                    FilterError::MissingAttribute {
                        component: component.clone(),
                        attribute: attribute.clone(),
                    }
                })?;
                let column = self.with_layout(component, column)?;
                Ok((attribute.clone(), deep_copy(&column)))
            })
            .collect::<Result<Vec<_>, FilterError>>()?;
        let indptr = match self.layout {
            Layout::Sparse(indptr) => Some(ScalarBuffer::from(indptr.to_vec())),
            Layout::Single | Layout::Dense(_) => None,
        };
        Ok(ColumnSet { columns, indptr })
    }

    /// Wrap a flat attribute column back into the source's dense batch shape.
    ///
    /// The batch count is taken from the source list, so batches of zero objects survive.
    fn with_layout(
        &self,
        component: &ComponentType,
        column: &ArrayRef,
    ) -> Result<ArrayRef, FilterError> {
        match self.layout {
            Layout::Dense(list) => {
                let item = Arc::new(Field::new("item", column.data_type().clone(), true));
                let data = ArrayData::builder(DataType::FixedSizeList(item, list.value_length()))
                    .len(list.len())
                    .nulls(list.nulls().cloned())
                    .add_child_data(column.to_data())
                    .build()
                    .map_err(|_| FilterError::UnsupportedStorage {
                        component: component.clone(),
                    })?;
                Ok(make_array(data))
            }
            Layout::Single | Layout::Sparse(_) => Ok(column.clone()),
        }
    }
}

/// Copy `array` into freshly allocated buffers.
fn deep_copy(array: &ArrayRef) -> ArrayRef {
    let data = array.to_data();
    let mut copy = MutableArrayData::new(vec![&data], false, data.len());
    copy.extend(0, 0, data.len());
    make_array(copy.freeze())
}

#[cfg(test)]
mod tests {
    use arrow_array::{Float64Array, Int32Array};
    use arrow_schema::Fields;

    use super::*;
    use crate::schema::SchemaRegistry;

    fn fields() -> Fields {
        Fields::from(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("u_pu", DataType::Float64, false),
            Field::new("u", DataType::Float64, false),
        ])
    }

    fn nodes(n: i32) -> StructArray {
        let ids: Vec<i32> = (0..n).collect();
        let u_pu: Vec<f64> = ids.iter().map(|&i| 1.0 + f64::from(i) / 100.0).collect();
        let u: Vec<f64> = u_pu.iter().map(|v| v * 10_500.0).collect();
        StructArray::new(
            fields(),
            vec![
                Arc::new(Int32Array::from(ids)) as ArrayRef,
                Arc::new(Float64Array::from(u_pu)) as ArrayRef,
                Arc::new(Float64Array::from(u)) as ArrayRef,
            ],
            None,
        )
    }

    fn schema() -> SchemaRegistry {
        SchemaRegistry::new().with_component(
            DatasetType::SymOutput,
            ComponentType::NODE,
            fields().iter().map(|f| f.as_ref().clone()),
        )
    }

    fn project(output: &Dataset, spec: FilterSpec) -> Result<ProjectedDataset, FilterError> {
        project_columnar(
            output,
            &spec,
            DatasetType::SymOutput,
            &[ComponentType::NODE],
            &schema(),
        )
    }

    #[test]
    fn dense_batch_columns_keep_batch_shape() {
        let output = Dataset::new()
            .with_component(ComponentType::NODE, ComponentStorage::dense(nodes(6), 3));
        let projected = project(
            &output,
            FilterSpec::mapping([(ComponentType::NODE, AttributeFilter::only(["u_pu"]))]),
        )
        .unwrap();
        let columns = projected.get("node").and_then(ProjectedComponent::as_columns).unwrap();
        let u_pu = columns.get("u_pu").unwrap().as_fixed_size_list();
        assert_eq!(u_pu.len(), 2);
        assert_eq!(u_pu.value_length(), 3);
        assert!(columns.indptr().is_none());
    }

    #[test]
    fn dense_batches_of_zero_objects_keep_their_count() {
        let item = Arc::new(Field::new("item", DataType::Struct(fields()), true));
        let data = ArrayData::builder(DataType::FixedSizeList(item, 0))
            .len(3)
            .add_child_data(nodes(0).to_data())
            .build()
            .unwrap();
        let storage = ComponentStorage::Dense(make_array(data));
        assert_eq!(crate::batch::batch_size(&ComponentType::NODE, &storage).unwrap(), 3);

        let output = Dataset::new().with_component(ComponentType::NODE, storage);
        let projected = project(
            &output,
            FilterSpec::mapping([(ComponentType::NODE, AttributeFilter::only(["id"]))]),
        )
        .unwrap();
        let ids = projected
            .get("node")
            .and_then(ProjectedComponent::as_columns)
            .and_then(|c| c.get("id"))
            .unwrap()
            .as_fixed_size_list();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids.value_length(), 0);
        assert!(ids.values().is_empty());
    }

    #[test]
    fn sparse_columns_carry_offsets() {
        let output = Dataset::new().with_component(
            ComponentType::NODE,
            ComponentStorage::sparse(nodes(3), vec![0i64, 2, 3]),
        );
        let projected = project(&output, FilterSpec::All).unwrap();
        let columns = projected.get("node").and_then(ProjectedComponent::as_columns).unwrap();
        assert_eq!(columns.names().collect::<Vec<_>>(), ["id", "u_pu", "u"]);
        assert_eq!(columns.indptr().map(|p| p.to_vec()), Some(vec![0, 2, 3]));
        assert_eq!(columns.get("id").unwrap().len(), 3);
    }

    #[test]
    fn missing_source_component_is_reported() {
        let err = project(&Dataset::new(), FilterSpec::All).unwrap_err();
        assert_eq!(
            err,
            FilterError::MissingComponent {
                component: ComponentType::NODE
            }
        );
    }

    #[test]
    fn deep_copy_allocates_new_buffers() {
        let source: ArrayRef = Arc::new(Float64Array::from(vec![1.0, 2.0]));
        let copy = deep_copy(&source);
        assert_eq!(copy.as_ref(), source.as_ref());
        let source_ptr = source.as_primitive::<arrow_array::types::Float64Type>().values().as_ptr();
        let copy_ptr = copy.as_primitive::<arrow_array::types::Float64Type>().values().as_ptr();
        assert_ne!(source_ptr, copy_ptr);
    }
}
