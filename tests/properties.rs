mod common;

use std::sync::Arc;

use grid_dataset::arrow_array::{
    FixedSizeListArray, Float64Array, Int8Array, Int32Array, cast::AsArray, types::Int32Type,
};
use grid_dataset::arrow_schema::{DataType, Field};
use grid_dataset::{ComponentStorage, ComponentType, Dataset, is_missing, split_batches};
use proptest::prelude::*;

use common::nodes;

fn ids(dataset: &Dataset) -> Vec<i32> {
    match dataset.get("node") {
        Some(ComponentStorage::Dense(array)) => array
            .as_struct()
            .column_by_name("id")
            .unwrap()
            .as_primitive::<Int32Type>()
            .values()
            .to_vec(),
        _ => Vec::new(),
    }
}

fn node_rows(n: usize) -> (Vec<i32>, Vec<f64>) {
    let ids: Vec<i32> = (0..n as i32).collect();
    let u_rated = ids.iter().map(|&i| f64::from(i)).collect();
    (ids, u_rated)
}

proptest! {
    #[test]
    fn sparse_split_covers_every_object_once(sizes in prop::collection::vec(0usize..5, 0..8)) {
        let mut indptr = vec![0i64];
        for size in &sizes {
            indptr.push(indptr[indptr.len() - 1] + *size as i64);
        }
        let total: usize = sizes.iter().sum();
        let (ids_in, u_rated) = node_rows(total);
        let batch = Dataset::new().with_component(
            ComponentType::NODE,
            ComponentStorage::sparse(nodes(&ids_in, &u_rated), indptr),
        );

        let datasets = split_batches(&batch).unwrap();
        prop_assert_eq!(datasets.len(), sizes.len());
        for (dataset, size) in datasets.iter().zip(&sizes) {
            prop_assert_eq!(ids(dataset).len(), *size);
            prop_assert_eq!(dataset.contains("node"), *size > 0);
        }
        let joined: Vec<i32> = datasets.iter().flat_map(ids).collect();
        prop_assert_eq!(joined, ids_in);
    }

    #[test]
    fn dense_split_restacks_to_the_source(batches in 1usize..6, per_batch in 1usize..5) {
        let (ids_in, u_rated) = node_rows(batches * per_batch);
        let batch = Dataset::new().with_component(
            ComponentType::NODE,
            ComponentStorage::dense(nodes(&ids_in, &u_rated), per_batch),
        );

        let datasets = split_batches(&batch).unwrap();
        prop_assert_eq!(datasets.len(), batches);
        for (i, dataset) in datasets.iter().enumerate() {
            let expected: Vec<i32> = ids_in[i * per_batch..(i + 1) * per_batch].to_vec();
            prop_assert_eq!(ids(dataset), expected);
        }
    }

    #[test]
    fn set_floats_are_never_missing(v in prop::num::f64::NORMAL | prop::num::f64::ZERO) {
        prop_assert!(!is_missing(&Float64Array::from(vec![v])).unwrap());
    }

    #[test]
    fn integers_are_missing_only_at_the_minimum(v in any::<i32>()) {
        let missing = is_missing(&Int32Array::from(vec![v])).unwrap();
        prop_assert_eq!(missing, v == i32::MIN);
    }

    #[test]
    fn small_integers_are_missing_only_at_the_minimum(v in any::<i8>()) {
        let missing = is_missing(&Int8Array::from(vec![v])).unwrap();
        prop_assert_eq!(missing, v == i8::MIN);
    }

    #[test]
    fn three_phase_values_are_missing_only_when_every_phase_is(
        phases in prop::collection::vec(prop::option::of(-1.0e6f64..1.0e6), 3)
    ) {
        let values: Vec<f64> = phases.iter().map(|p| p.unwrap_or(f64::NAN)).collect();
        let item = Arc::new(Field::new("item", DataType::Float64, true));
        let value = FixedSizeListArray::new(item, 3, Arc::new(Float64Array::from(values)), None);
        let missing = is_missing(&value).unwrap();
        prop_assert_eq!(missing, phases.iter().all(Option::is_none));
    }

    #[test]
    fn all_nan_values_are_missing(n in 0usize..10) {
        prop_assert!(is_missing(&Float64Array::from(vec![f64::NAN; n])).unwrap());
    }
}
