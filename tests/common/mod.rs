#![allow(dead_code)]

use std::sync::Arc;

use grid_dataset::arrow_array::{ArrayRef, Float64Array, Int8Array, Int32Array, StructArray};
use grid_dataset::arrow_schema::{DataType, Field, Fields};
use grid_dataset::{ComponentType, DatasetType, SchemaRegistry};

pub fn node_fields() -> Fields {
    Fields::from(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("u_rated", DataType::Float64, false),
    ])
}

/// Node fields whose `u_rated` may hold null slots.
pub fn nullable_node_fields() -> Fields {
    Fields::from(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("u_rated", DataType::Float64, true),
    ])
}

pub fn line_fields() -> Fields {
    Fields::from(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("from_node", DataType::Int32, false),
        Field::new("to_node", DataType::Int32, false),
        Field::new("from_status", DataType::Int8, false),
    ])
}

/// Nodes with the given ids and `u_rated` values.
pub fn nodes(ids: &[i32], u_rated: &[f64]) -> StructArray {
    StructArray::new(
        node_fields(),
        vec![
            Arc::new(Int32Array::from(ids.to_vec())) as ArrayRef,
            Arc::new(Float64Array::from(u_rated.to_vec())) as ArrayRef,
        ],
        None,
    )
}

/// Lines with the given ids, all connecting node 1 to node 2 and switched on.
pub fn lines(ids: &[i32]) -> StructArray {
    let n = ids.len();
    StructArray::new(
        line_fields(),
        vec![
            Arc::new(Int32Array::from(ids.to_vec())) as ArrayRef,
            Arc::new(Int32Array::from(vec![1; n])) as ArrayRef,
            Arc::new(Int32Array::from(vec![2; n])) as ArrayRef,
            Arc::new(Int8Array::from(vec![1; n])) as ArrayRef,
        ],
        None,
    )
}

pub fn sym_output_fields() -> Fields {
    Fields::from(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("energized", DataType::Int8, false),
        Field::new("u_pu", DataType::Float64, false),
        Field::new("u", DataType::Float64, false),
    ])
}

/// Symmetric node output rows: `u_pu` and `u` derived from the id.
pub fn node_output(n: i32) -> StructArray {
    let ids: Vec<i32> = (1..=n).collect();
    let u_pu: Vec<f64> = ids.iter().map(|&i| 1.0 - f64::from(i) / 100.0).collect();
    let u: Vec<f64> = u_pu.iter().map(|v| v * 10_500.0).collect();
    StructArray::new(
        sym_output_fields(),
        vec![
            Arc::new(Int32Array::from(ids)) as ArrayRef,
            Arc::new(Int8Array::from(vec![1; n as usize])) as ArrayRef,
            Arc::new(Float64Array::from(u_pu)) as ArrayRef,
            Arc::new(Float64Array::from(u)) as ArrayRef,
        ],
        None,
    )
}

/// Schema with `node`/`line` inputs and `node` symmetric output.
pub fn schema() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.insert(DatasetType::Input, ComponentType::NODE, node_fields());
    registry.insert(DatasetType::Input, ComponentType::LINE, line_fields());
    registry.insert(DatasetType::SymOutput, ComponentType::NODE, sym_output_fields());
    registry.insert(
        DatasetType::SymOutput,
        ComponentType::LINE,
        Fields::from(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("i_from", DataType::Float64, false),
        ]),
    );
    registry
}
