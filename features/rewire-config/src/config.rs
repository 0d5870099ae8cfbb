use rewire_di::{ArgKey, ConfigError, RawArguments, Value};
use serde_json::Value as JsonValue;

/// Converts a document value into a container [Value]
pub fn to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(value) => Value::Bool(*value),
        JsonValue::Number(number) => match number.as_i64() {
            Some(int) => Value::Int(int),
            None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(value) => Value::String(value.clone()),
        JsonValue::Array(values) => Value::List(values.iter().map(to_value).collect()),
        JsonValue::Object(map) => Value::Map(
            map.iter()
                .map(|(key, value)| (key.clone(), to_value(value)))
                .collect(),
        ),
    }
}

/// Reads an argument list
///
/// Arrays are purely positional. In objects, keys that are integers are
/// positional and every other key names a parameter. `null` is an empty list.
pub fn to_arguments(value: &JsonValue, context: &str) -> Result<RawArguments, ConfigError> {
    match value {
        JsonValue::Null => Ok(RawArguments::new()),
        JsonValue::Array(values) => Ok(RawArguments::positional(values.iter().map(to_value))),
        JsonValue::Object(map) => Ok(map
            .iter()
            .map(|(key, value)| {
                let key = match key.parse::<usize>() {
                    Ok(position) => ArgKey::Position(position),
                    Err(_) => ArgKey::Named(key.clone()),
                };
                (key, to_value(value))
            })
            .collect()),
        _ => Err(ConfigError::InvalidConfiguration(format!(
            "'{context}' must be a list or a map of arguments"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn it_converts_scalars_and_collections() {
        let value = to_value(&json!({
            "flag": true,
            "count": 3,
            "ratio": 0.5,
            "tags": ["a", null],
        }));

        let Value::Map(map) = value else {
            panic!("Expected a map");
        };
        assert_eq!(map["flag"], Value::Bool(true));
        assert_eq!(map["count"], Value::Int(3));
        assert_eq!(map["ratio"], Value::Float(0.5));
        assert_eq!(map["tags"], Value::List(vec![Value::from("a"), Value::Null]));
    }

    #[test]
    fn it_reads_positional_lists() {
        let args = to_arguments(&json!(["@a", 1]), "constructorInjection").unwrap();

        assert_eq!(
            args,
            RawArguments::positional([Value::from("@a"), Value::Int(1)])
        );
    }

    #[test]
    fn it_reads_mixed_maps_in_document_order() {
        let args = to_arguments(&json!({"0": "A", "b": "B"}), "constructorInjection").unwrap();

        assert_eq!(
            args.entries(),
            &[
                (ArgKey::Position(0), Value::from("A")),
                (ArgKey::Named("b".into()), Value::from("B")),
            ]
        );
    }

    #[test]
    fn it_treats_null_as_empty() {
        let args = to_arguments(&JsonValue::Null, "methodArgs").unwrap();

        assert!(args.is_empty());
    }

    #[test]
    fn it_rejects_scalars() {
        let err = to_arguments(&json!("@a"), "methodArgs").unwrap_err();

        assert_eq!(
            err,
            ConfigError::InvalidConfiguration("'methodArgs' must be a list or a map of arguments".into())
        );
    }
}
