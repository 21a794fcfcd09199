//! Built-in scalars and the `inspect` formatting used in coercion error messages.

use std::{fmt::Write, sync::Arc};

use async_graphql_value::{ConstValue, Number};

use crate::ScalarType;

/// Serialization or parsing function of a scalar. Errors are plain messages.
pub type ScalarFn = Arc<dyn Fn(&ConstValue) -> Result<ConstValue, String> + Send + Sync>;

pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

pub(crate) fn builtin_scalars() -> [ScalarType; 5] {
    [int(), float(), string(), boolean(), id()]
}

fn builtin(
    name: &str,
    description: &str,
    serialize: fn(&ConstValue) -> Result<ConstValue, String>,
    parse_value: fn(&ConstValue) -> Result<ConstValue, String>,
    parse_literal: fn(&ConstValue) -> Result<ConstValue, String>,
) -> ScalarType {
    let mut scalar = ScalarType::new(name);
    scalar.description = Some(description.to_string());
    scalar.serialize = Arc::new(serialize);
    scalar.parse_value = Arc::new(parse_value);
    scalar.parse_literal = Arc::new(parse_literal);
    scalar
}

fn int() -> ScalarType {
    builtin(
        "Int",
        "The `Int` scalar type represents non-fractional signed whole numeric values. Int can represent values between -(2^31) and 2^31 - 1.",
        |value| {
            let number = match value {
                ConstValue::Boolean(boolean) => Some(f64::from(u8::from(*boolean))),
                ConstValue::Number(number) => number.as_f64(),
                ConstValue::String(string) if !string.trim().is_empty() => string.trim().parse::<f64>().ok(),
                _ => None,
            };
            coerce_int(number, value, inspect(value))
        },
        |value| match value {
            ConstValue::Number(number) => coerce_int(number.as_f64(), value, inspect(value)),
            _ => Err(format!("Int cannot represent non-integer value: {}", inspect(value))),
        },
        |value| match value {
            ConstValue::Number(number) if number.is_i64() || number.is_u64() => {
                coerce_int(number.as_f64(), value, value.to_string())
            }
            _ => Err(format!("Int cannot represent non-integer value: {value}")),
        },
    )
}

fn coerce_int(number: Option<f64>, value: &ConstValue, shown: String) -> Result<ConstValue, String> {
    let Some(number) = number.filter(|number| number.is_finite() && number.fract() == 0.0) else {
        return Err(format!("Int cannot represent non-integer value: {shown}"));
    };

    if number > f64::from(i32::MAX) || number < f64::from(i32::MIN) {
        return Err(format!(
            "Int cannot represent non 32-bit signed integer value: {}",
            match value {
                ConstValue::Number(_) => value.to_string(),
                _ => shown,
            }
        ));
    }

    Ok(ConstValue::Number(Number::from(number as i32)))
}

fn float() -> ScalarType {
    builtin(
        "Float",
        "The `Float` scalar type represents signed double-precision fractional values as specified by [IEEE 754](https://en.wikipedia.org/wiki/IEEE_floating_point).",
        |value| {
            let number = match value {
                ConstValue::Boolean(boolean) => Number::from_f64(f64::from(u8::from(*boolean))),
                ConstValue::Number(number) => Some(number.clone()),
                ConstValue::String(string) if !string.trim().is_empty() => {
                    string.trim().parse::<f64>().ok().and_then(Number::from_f64)
                }
                _ => None,
            };
            number
                .map(ConstValue::Number)
                .ok_or_else(|| format!("Float cannot represent non numeric value: {}", inspect(value)))
        },
        |value| match value {
            ConstValue::Number(_) => Ok(value.clone()),
            _ => Err(format!("Float cannot represent non numeric value: {}", inspect(value))),
        },
        |value| match value {
            ConstValue::Number(_) => Ok(value.clone()),
            _ => Err(format!("Float cannot represent non numeric value: {value}")),
        },
    )
}

fn string() -> ScalarType {
    builtin(
        "String",
        "The `String` scalar type represents textual data, represented as UTF-8 character sequences. The String type is most often used by GraphQL to represent free-form human-readable text.",
        |value| match value {
            ConstValue::String(_) => Ok(value.clone()),
            ConstValue::Boolean(boolean) => Ok(ConstValue::String(boolean.to_string())),
            ConstValue::Number(number) => Ok(ConstValue::String(number.to_string())),
            ConstValue::Enum(name) => Ok(ConstValue::String(name.to_string())),
            _ => Err(format!("String cannot represent value: {}", inspect(value))),
        },
        |value| match value {
            ConstValue::String(_) => Ok(value.clone()),
            _ => Err(format!("String cannot represent a non string value: {}", inspect(value))),
        },
        |value| match value {
            ConstValue::String(_) => Ok(value.clone()),
            _ => Err(format!("String cannot represent a non string value: {value}")),
        },
    )
}

fn boolean() -> ScalarType {
    builtin(
        "Boolean",
        "The `Boolean` scalar type represents `true` or `false`.",
        |value| match value {
            ConstValue::Boolean(_) => Ok(value.clone()),
            ConstValue::Number(number) => number
                .as_f64()
                .map(|number| ConstValue::Boolean(number != 0.0))
                .ok_or_else(|| format!("Boolean cannot represent a non boolean value: {}", inspect(value))),
            _ => Err(format!("Boolean cannot represent a non boolean value: {}", inspect(value))),
        },
        |value| match value {
            ConstValue::Boolean(_) => Ok(value.clone()),
            _ => Err(format!("Boolean cannot represent a non boolean value: {}", inspect(value))),
        },
        |value| match value {
            ConstValue::Boolean(_) => Ok(value.clone()),
            _ => Err(format!("Boolean cannot represent a non boolean value: {value}")),
        },
    )
}

fn id() -> ScalarType {
    builtin(
        "ID",
        "The `ID` scalar type represents a unique identifier, often used to refetch an object or as key for a cache. The ID type appears in a JSON response as a String; however, it is not intended to be human-readable. When expected as an input type, any string (such as `\"4\"`) or integer (such as `4`) input value will be accepted as an ID.",
        |value| match value {
            ConstValue::String(_) => Ok(value.clone()),
            ConstValue::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(ConstValue::String(number.to_string()))
            }
            _ => Err(format!("ID cannot represent value: {}", inspect(value))),
        },
        |value| match value {
            ConstValue::String(_) => Ok(value.clone()),
            ConstValue::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(ConstValue::String(number.to_string()))
            }
            _ => Err(format!("ID cannot represent value: {}", inspect(value))),
        },
        |value| match value {
            ConstValue::String(_) => Ok(value.clone()),
            ConstValue::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(ConstValue::String(number.to_string()))
            }
            _ => Err(format!("ID cannot represent a non-string and non-integer value: {value}")),
        },
    )
}

/// Formats a runtime value for error messages: strings are quoted, objects are spaced.
pub fn inspect(value: &ConstValue) -> String {
    let mut out = String::new();
    write_inspected(&mut out, value);
    out
}

fn write_inspected(out: &mut String, value: &ConstValue) {
    match value {
        ConstValue::Null => out.push_str("null"),
        ConstValue::Number(number) => write!(out, "{number}").unwrap_or_default(),
        ConstValue::String(string) => write!(out, "{string:?}").unwrap_or_default(),
        ConstValue::Boolean(boolean) => write!(out, "{boolean}").unwrap_or_default(),
        ConstValue::Binary(bytes) => write!(out, "<{} bytes>", bytes.len()).unwrap_or_default(),
        ConstValue::Enum(name) => out.push_str(name),
        ConstValue::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_inspected(out, item);
            }
            out.push(']');
        }
        ConstValue::Object(fields) if fields.is_empty() => out.push_str("{}"),
        ConstValue::Object(fields) => {
            out.push_str("{ ");
            for (i, (name, field)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(name);
                out.push_str(": ");
                write_inspected(out, field);
            }
            out.push_str(" }");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialize(scalar: &ScalarType, value: serde_json::Value) -> Result<ConstValue, String> {
        (scalar.serialize)(&ConstValue::from_json(value).unwrap())
    }

    #[test]
    fn int_serialization() {
        let int = int();
        assert_eq!(serialize(&int, serde_json::json!(3)), Ok(ConstValue::from(3)));
        assert_eq!(serialize(&int, serde_json::json!(true)), Ok(ConstValue::from(1)));
        assert_eq!(serialize(&int, serde_json::json!("12")), Ok(ConstValue::from(12)));
        assert_eq!(
            serialize(&int, serde_json::json!(1.5)),
            Err("Int cannot represent non-integer value: 1.5".to_string())
        );
        assert_eq!(
            serialize(&int, serde_json::json!(9_876_504_321_i64)),
            Err("Int cannot represent non 32-bit signed integer value: 9876504321".to_string())
        );
        assert_eq!(
            serialize(&int, serde_json::json!("abc")),
            Err("Int cannot represent non-integer value: \"abc\"".to_string())
        );
    }

    #[test]
    fn id_accepts_strings_and_integers() {
        let id = id();
        assert_eq!(serialize(&id, serde_json::json!(12)), Ok(ConstValue::from("12")));
        assert_eq!((id.parse_value)(&ConstValue::from("x")), Ok(ConstValue::from("x")));
        assert!((id.parse_literal)(&ConstValue::Boolean(true)).is_err());
    }

    #[test]
    fn inspect_values() {
        let value = ConstValue::from_json(serde_json::json!({"a": [1, "b"], "c": null})).unwrap();
        assert_eq!(inspect(&value), "{ a: [1, \"b\"], c: null }");
    }
}
