mod common;

use grid_dataset::{
    AttributeFilter, ComponentType, DatasetType, FilterError, FilterSpec, SchemaLookup,
    normalize_filter,
};

use common::schema;

fn available() -> Vec<ComponentType> {
    vec![ComponentType::NODE, ComponentType::LINE]
}

#[test]
fn no_filter_keeps_every_available_component() {
    let filter = normalize_filter(
        &FilterSpec::default(),
        DatasetType::SymOutput,
        &available(),
        &schema(),
    )
    .unwrap();
    assert_eq!(filter.len(), 2);
    assert!(filter.iter().all(|(_, f)| *f == AttributeFilter::All));
}

#[test]
fn component_list_keeps_only_listed_components() {
    let filter = normalize_filter(
        &FilterSpec::components(["node"]),
        DatasetType::SymOutput,
        &available(),
        &schema(),
    )
    .unwrap();
    assert_eq!(filter.len(), 1);
    assert_eq!(filter.get("node"), Some(&AttributeFilter::Unrestricted));
}

#[test]
fn empty_attribute_list_keeps_the_component() {
    let filter = normalize_filter(
        &FilterSpec::mapping([
            (ComponentType::NODE, AttributeFilter::none()),
            (ComponentType::LINE, AttributeFilter::only(["i_from"])),
        ]),
        DatasetType::SymOutput,
        &available(),
        &schema(),
    )
    .unwrap();
    assert_eq!(filter.get("node"), Some(&AttributeFilter::Only(Vec::new())));
    assert_eq!(filter.get("line"), Some(&AttributeFilter::only(["i_from"])));
}

#[test]
fn unknown_names_are_listed_in_one_error() {
    let err = normalize_filter(
        &FilterSpec::mapping([
            (ComponentType::new("bus"), AttributeFilter::All),
            (ComponentType::NODE, AttributeFilter::only(["u_rated"])),
        ]),
        DatasetType::SymOutput,
        &available(),
        &schema(),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"unknown component types: ["bus"]; unknown attributes: {node: ["u_rated"]}"#
    );
}

#[test]
fn input_attributes_are_not_output_attributes() {
    let schema = schema();
    assert!(schema.contains_component(DatasetType::Input, &ComponentType::LINE));
    let err = normalize_filter(
        &FilterSpec::mapping([(ComponentType::LINE, AttributeFilter::only(["from_node"]))]),
        DatasetType::SymOutput,
        &available(),
        &schema,
    )
    .unwrap_err();
    assert!(matches!(err, FilterError::Unknown { ref components, .. } if components.is_empty()));
}

#[test]
fn repeated_component_in_mapping_is_invalid() {
    let err = normalize_filter(
        &FilterSpec::mapping([
            (ComponentType::LINE, AttributeFilter::Unrestricted),
            (ComponentType::LINE, AttributeFilter::All),
        ]),
        DatasetType::SymOutput,
        &available(),
        &schema(),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid filter provided: component 'line' appears more than once"
    );
}
