use serde_json::json;

use agentllm::error::AgentError;
use agentllm::registry::{
    schema_from_params, sync_handler, FunctionDefinition, FunctionRegistry, ParamKind, ParamSpec,
};

fn noop() -> agentllm::registry::FunctionHandler {
    sync_handler(|_| Ok(serde_json::Value::Null))
}

#[test]
fn inferred_schema_matches_declared_signature() {
    // register("f", "d", func(name: str, age: int = 0, notes: str | absent))
    let mut registry = FunctionRegistry::new();
    registry
        .register(
            "f",
            "d",
            vec![
                ParamSpec::of("name", "String"),
                ParamSpec::of("age", "i64").with_default(json!(0)),
                ParamSpec::of("notes", "Option<String>"),
            ],
            noop(),
        )
        .unwrap();

    let spec = &registry.list()[0];
    assert_eq!(spec.name, "f");
    assert_eq!(spec.description, "d");
    assert_eq!(
        spec.parameters,
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer", "default": 0},
                "notes": {"type": "string"}
            },
            "required": ["name"]
        })
    );
}

#[test]
fn every_kind_maps_to_its_json_type() {
    let schema = schema_from_params(&[
        ParamSpec::of("s", "String"),
        ParamSpec::of("i", "u32"),
        ParamSpec::of("n", "f64"),
        ParamSpec::of("b", "bool"),
        ParamSpec::of("v", "Vec<String>"),
        ParamSpec::of("m", "HashMap<String, String>"),
        ParamSpec::of("unknown", "CustomerRecord"),
    ]);
    let props = &schema["properties"];
    assert_eq!(props["s"]["type"], "string");
    assert_eq!(props["i"]["type"], "integer");
    assert_eq!(props["n"]["type"], "number");
    assert_eq!(props["b"]["type"], "boolean");
    assert_eq!(props["v"]["type"], "array");
    assert_eq!(props["m"]["type"], "object");
    // Unrecognised types degrade to string.
    assert_eq!(props["unknown"]["type"], "string");
}

#[test]
fn explicit_schema_is_stored_verbatim() {
    let schema = json!({
        "type": "object",
        "properties": {"expression": {"type": "string", "description": "算式"}},
        "required": ["expression"]
    });
    let mut registry = FunctionRegistry::new();
    registry
        .register_with_schema("calc", "计算器", schema.clone(), noop())
        .unwrap();
    assert_eq!(registry.get("calc").unwrap().parameters, schema);
}

#[test]
fn descriptions_surface_in_the_schema() {
    let schema = schema_from_params(&[
        ParamSpec::new("name", ParamKind::String).with_description("顾客姓名")
    ]);
    assert_eq!(schema["properties"]["name"]["description"], "顾客姓名");
}

#[test]
fn has_get_and_len_reflect_registration() {
    let mut registry = FunctionRegistry::new();
    assert!(registry.is_empty());
    assert!(!registry.has("f"));
    assert!(registry.get("f").is_none());

    registry.register("f", "d", vec![], noop()).unwrap();
    assert!(registry.has("f"));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("f").unwrap().description, "d");
}

#[test]
fn empty_name_fails_registration() {
    let mut registry = FunctionRegistry::new();
    let err = registry.register("", "d", vec![], noop()).unwrap_err();
    assert!(matches!(err, AgentError::Configuration(_)));
    assert!(registry.is_empty());
}

#[test]
fn reregistration_replaces_and_keeps_position() {
    let mut registry = FunctionRegistry::new();
    registry.register("a", "first", vec![], noop()).unwrap();
    registry.register("b", "second", vec![], noop()).unwrap();
    registry.register("a", "replaced", vec![], noop()).unwrap();

    let specs = registry.list();
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].name, "a");
    assert_eq!(specs[0].description, "replaced");
    assert_eq!(specs[1].name, "b");
}

#[test]
fn schema_only_definitions_are_allowed() {
    let mut registry = FunctionRegistry::new();
    registry
        .register_definition(FunctionDefinition {
            name: "planned".to_string(),
            description: "not wired up yet".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
            handler: None,
        })
        .unwrap();
    assert!(registry.has("planned"));
    assert!(registry.get("planned").unwrap().handler.is_none());
}
