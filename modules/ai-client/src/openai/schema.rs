use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A type a model can be asked to produce as strict JSON.
///
/// Implemented for every `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// JSON Schema in the shape strict structured-output endpoints accept:
    /// every object closed with `additionalProperties: false`, every property
    /// listed in `required` (nullable ones included), and no `$ref`s.
    fn openai_schema() -> Value {
        let mut root = serde_json::to_value(schema_for!(Self)).unwrap_or_default();

        let definitions = match &mut root {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions").unwrap_or(Value::Null)
            }
            _ => Value::Null,
        };

        strictify(&mut root, &definitions);
        root
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn strictify(node: &mut Value, definitions: &Value) {
    while let Some(target) = resolve(node, definitions) {
        *node = target;
    }

    match node {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                let required: Option<Vec<Value>> = map
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().map(Value::String).collect());
                if let Some(required) = required {
                    map.insert("required".to_string(), Value::Array(required));
                }
            }
            map.values_mut()
                .for_each(|child| strictify(child, definitions));
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| strictify(item, definitions)),
        _ => {}
    }
}

/// What a `$ref`, or the single-entry `allOf` schemars wraps a described
/// `$ref` in, stands for.
fn resolve(node: &Value, definitions: &Value) -> Option<Value> {
    if let Some(path) = node.get("$ref").and_then(Value::as_str) {
        let name = path.strip_prefix("#/definitions/")?;
        return definitions.get(name).cloned();
    }
    match node.get("allOf")?.as_array()?.as_slice() {
        [only] => Some(only.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Degree {
        name: String,
        reason: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Recommendation {
        degrees: Vec<Degree>,
        best: Degree,
    }

    #[test]
    fn lists_every_property_as_required() {
        let schema = Degree::openai_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .expect("required array")
            .iter()
            .filter_map(|v| v.as_str())
            .collect();

        assert!(required.contains(&"name"));
        assert!(required.contains(&"reason"));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn inlines_nested_definitions() {
        let schema = Recommendation::openai_schema();
        assert!(schema.get("definitions").is_none());
        assert!(schema.get("$schema").is_none());

        let best = &schema["properties"]["best"];
        assert!(best.get("$ref").is_none());
        assert_eq!(best["type"], "object");
        assert_eq!(best["additionalProperties"], false);

        let item = &schema["properties"]["degrees"]["items"];
        assert!(item.get("$ref").is_none());
        assert_eq!(item["additionalProperties"], false);
    }
}
