#![deny(missing_docs)]
//! grid-dataset: Arrow-backed power-grid datasets.
//!
//! A dataset maps component types (`node`, `line`, ...) to structured arrays of objects.
//! This crate splits batch datasets into per-batch datasets, converts datasets to a native
//! row-wise form with missing values dropped, and projects computed output onto a selection
//! of components and attributes.

pub mod batch;
pub mod error;
pub mod filter;
pub mod missing;
pub mod native;
pub mod projection;
pub mod schema;
pub mod storage;
pub mod token;

/// Prelude exporting the most common types and entry points.
pub mod prelude {
    pub use crate::filter::{AttributeFilter, FilterSpec};
    pub use crate::schema::{SchemaLookup, SchemaRegistry};
    pub use crate::storage::{ComponentStorage, Dataset, SparseBatch};
    pub use crate::token::{ComponentType, DatasetType};
}

// Re-export Arrow crates so downstream users build arrays against the same versions.
pub use arrow_array;
pub use arrow_buffer;
pub use arrow_schema;

pub use crate::batch::{batch_size, split_batches, split_dense, split_sparse, verify_batch_sizes};
pub use crate::error::{DatasetError, FilterError};
pub use crate::filter::{
    AttributeFilter, DataFilter, FilterSpec, normalize_filter, validate_filter,
};
pub use crate::missing::{ValueKind, is_missing};
pub use crate::native::{
    NativeDataset, NativeObject, NativeSingleDataset, NativeValue, dataset_to_native,
    is_batch_dataset, single_dataset_to_native,
};
pub use crate::projection::{ColumnSet, ProjectedComponent, ProjectedDataset, project_columnar};
pub use crate::schema::{SchemaLookup, SchemaRegistry};
pub use crate::storage::{ComponentStorage, Dataset, SparseBatch, rank};
pub use crate::token::{ComponentType, DatasetType, UnknownDatasetType};
