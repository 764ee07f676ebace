//! Batch size inspection and splitting of batch datasets into per-batch datasets.

use arrow_array::{Array, ArrayRef, cast::AsArray};
use arrow_schema::DataType;
use tracing::{debug, trace};

use crate::error::DatasetError;
use crate::storage::{ComponentStorage, Dataset, SparseBatch, innermost, rank};
use crate::token::ComponentType;

/// Number of batches held by one component's storage.
///
/// A rank-1 dense array is a single implicit batch; a rank-2 dense array has one batch per
/// outer slot; a sparse batch has `indptr.len() - 1` batches.
///
/// # Errors
/// Returns [`DatasetError::TypeMismatch`] if dense objects are not a struct array, and
/// [`DatasetError::FormatViolation`] for dense arrays of rank other than 1 or 2 and for an empty
/// `indptr`.
pub fn batch_size(
    component: &ComponentType,
    storage: &ComponentStorage,
) -> Result<usize, DatasetError> {
    match storage {
        ComponentStorage::Dense(array) => {
            if !matches!(innermost(array.data_type()), DataType::Struct(_)) {
                return Err(DatasetError::type_mismatch(
                    component,
                    "a 1D/2D structured array",
                    array.data_type(),
                ));
            }
            match rank(array.data_type()) {
                1 => Ok(1),
                2 => Ok(array.len()),
                n => Err(DatasetError::format(
                    component,
                    format!("invalid data dimension {n} (should be a 1D/2D structured array)"),
                )),
            }
        }
        ComponentStorage::Sparse(sparse) => sparse.num_batches().ok_or_else(|| {
            DatasetError::format(
                component,
                "invalid batch data format, expected 'indptr' to contain at least one offset",
            )
        }),
    }
}

/// Determine the batch count of `dataset` and check that every component agrees on it.
///
/// An empty dataset has zero batches.
///
/// # Errors
/// Returns [`DatasetError::BatchSizeMismatch`] naming the first disagreeing component and the
/// components checked before it, or any error from [`batch_size`].
pub fn verify_batch_sizes(dataset: &Dataset) -> Result<usize, DatasetError> {
    let mut batches = 0;
    let mut checked: Vec<ComponentType> = Vec::with_capacity(dataset.len());
    for (component, storage) in dataset.iter() {
        let component_batches = batch_size(component, storage)?;
        if !checked.is_empty() && component_batches != batches {
            return Err(DatasetError::BatchSizeMismatch {
                component: component.clone(),
                batches: component_batches,
                checked,
                checked_batches: batches,
            });
        }
        batches = component_batches;
        checked.push(component.clone());
    }
    Ok(batches)
}

/// Split a batch dataset into one single dataset per batch.
///
/// Components may mix dense and sparse layouts. A component is left out of a batch whose
/// slice for it is empty.
///
/// # Errors
/// Returns [`DatasetError`] if batch counts disagree, a layout has the wrong rank or type, or
/// sparse offsets are invalid.
pub fn split_batches(batch: &Dataset) -> Result<Vec<Dataset>, DatasetError> {
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    let num_batches = verify_batch_sizes(batch)?;
    debug!(
        components = batch.len(),
        batches = num_batches,
        "splitting batch dataset"
    );

    let mut datasets: Vec<Dataset> = (0..num_batches).map(|_| Dataset::new()).collect();
    for (component, storage) in batch.iter() {
        let slices = match storage {
            ComponentStorage::Dense(array) => split_dense(component, array)?,
            ComponentStorage::Sparse(sparse) => split_sparse(component, sparse)?,
        };
        trace!(component = %component, slices = slices.len(), "split component");
        for (dataset, slice) in datasets.iter_mut().zip(slices) {
            if !slice.is_empty() {
                dataset.insert(component.clone(), ComponentStorage::Dense(slice));
            }
        }
    }
    Ok(datasets)
}

/// Split a dense array into its batches: a rank-1 array is its own single batch, a rank-2
/// array yields one rank-1 array per outer slot.
///
/// # Errors
/// Returns [`DatasetError::TypeMismatch`] if the objects are not a struct array, or
/// [`DatasetError::FormatViolation`] for any rank other than 1 or 2.
pub fn split_dense(
    component: &ComponentType,
    array: &ArrayRef,
) -> Result<Vec<ArrayRef>, DatasetError> {
    match array.data_type() {
        DataType::Struct(_) => Ok(vec![array.clone()]),
        DataType::FixedSizeList(item, _) => match item.data_type() {
            DataType::Struct(_) => {
                let list = array.as_fixed_size_list();
                Ok((0..list.len()).map(|i| list.value(i)).collect())
            }
            DataType::FixedSizeList(_, _) => Err(DatasetError::format(
                component,
                format!(
                    "invalid data dimension {} (should be a 1D/2D structured array)",
                    rank(array.data_type())
                ),
            )),
            other => Err(DatasetError::type_mismatch(
                component,
                "a 1D/2D structured array",
                other,
            )),
        },
        other => Err(DatasetError::type_mismatch(
            component,
            "a 1D/2D structured array",
            other,
        )),
    }
}

/// Split a sparse batch into its batches after checking its offsets.
///
/// # Errors
/// Returns [`DatasetError::TypeMismatch`] if `data` is not a rank-1 struct array, or
/// [`DatasetError::FormatViolation`] if the offsets break the CSR invariants.
pub fn split_sparse(
    component: &ComponentType,
    sparse: &SparseBatch,
) -> Result<Vec<ArrayRef>, DatasetError> {
    if !matches!(sparse.data.data_type(), DataType::Struct(_)) {
        return Err(DatasetError::type_mismatch(
            component,
            "a 1D structured array (i.e. a single table) as sparse data",
            sparse.data.data_type(),
        ));
    }
    sparse
        .validate()
        .map_err(|message| DatasetError::format(component, message))?;

    let num_batches = sparse.indptr.len() - 1;
    Ok((0..num_batches).map(|i| sparse.batch(i)).collect())
}
