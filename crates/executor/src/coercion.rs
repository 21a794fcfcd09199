//! Coercion of variable values and field arguments against their input types.

use indexmap::IndexMap;
use schema::{
    ast, inspect, is_builtin_scalar, ArgumentValues, ConstValue, InputValue, Name, NamedType, PathSegment, Pos,
    Positioned, Schema, TypeRef, Value, VariableValues,
};

use crate::GraphqlError;

pub(crate) fn coerce_variable_values(
    schema: &Schema,
    definitions: &[Positioned<ast::VariableDefinition>],
    inputs: &VariableValues,
) -> Result<VariableValues, Vec<GraphqlError>> {
    let mut coerced = VariableValues::new();
    let mut errors = Vec::new();

    for definition in definitions {
        let name = &definition.node.name.node;
        let ty = TypeRef::from_ast(&definition.node.var_type.node);

        if !schema.get_type(&ty.name).is_some_and(NamedType::is_input_type) {
            errors.push(
                GraphqlError::new(format!(
                    "Variable \"${name}\" expected value of type \"{ty}\" which cannot be used as an input type."
                ))
                .with_location(definition.node.var_type.pos),
            );
            continue;
        }

        let Some(value) = inputs.get(name) else {
            if let Some(default_value) = &definition.node.default_value {
                let default_value = default_value.node.clone().into_value();
                if let Some(value) = value_from_ast(schema, &default_value, &ty, &VariableValues::new()) {
                    coerced.insert(name.clone(), value);
                }
            } else if ty.is_non_null() {
                errors.push(
                    GraphqlError::new(format!("Variable \"${name}\" of required type \"{ty}\" was not provided."))
                        .with_location(definition.pos),
                );
            }
            continue;
        };

        if value == &ConstValue::Null && ty.is_non_null() {
            errors.push(
                GraphqlError::new(format!("Variable \"${name}\" of non-null type \"{ty}\" must not be null."))
                    .with_location(definition.pos),
            );
            continue;
        }

        let mut coercion = InputCoercion {
            schema,
            errors: Vec::new(),
        };
        let value = coercion.coerce(value, &ty, &mut Vec::new());

        if coercion.errors.is_empty() {
            coerced.insert(name.clone(), value);
            continue;
        }

        for error in coercion.errors {
            let mut message = format!("Variable \"${name}\" got invalid value {}", inspect(&error.value));
            if !error.path.is_empty() {
                message.push_str(&format!(" at \"{name}{}\"", print_path(&error.path)));
            }
            message.push_str("; ");
            message.push_str(&error.message);

            errors.push(GraphqlError::new(message).with_location(definition.pos));
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

fn print_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(|segment| match segment {
            PathSegment::Index(index) => format!("[{index}]"),
            PathSegment::Field(name) => format!(".{name}"),
        })
        .collect()
}

struct InputError {
    path: Vec<PathSegment>,
    value: ConstValue,
    message: String,
}

/// Coercion of runtime input values, collecting every error with the path it happened at.
struct InputCoercion<'a> {
    schema: &'a Schema,
    errors: Vec<InputError>,
}

impl InputCoercion<'_> {
    fn error(&mut self, path: &[PathSegment], value: &ConstValue, message: String) -> ConstValue {
        self.errors.push(InputError {
            path: path.to_vec(),
            value: value.clone(),
            message,
        });
        ConstValue::Null
    }

    fn coerce(&mut self, value: &ConstValue, ty: &TypeRef, path: &mut Vec<PathSegment>) -> ConstValue {
        if ty.is_non_null() {
            if value == &ConstValue::Null {
                return self.error(
                    path,
                    value,
                    format!("Expected non-nullable type \"{ty}\" not to be null."),
                );
            }
            return self.coerce(value, &ty.without_non_null(), path);
        }

        if value == &ConstValue::Null {
            return ConstValue::Null;
        }

        if let Some(item_type) = ty.item_type() {
            let ConstValue::List(items) = value else {
                return ConstValue::List(vec![self.coerce(value, &item_type, path)]);
            };

            let items = items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    path.push(PathSegment::Index(index));
                    let item = self.coerce(item, &item_type, path);
                    path.pop();
                    item
                })
                .collect();

            return ConstValue::List(items);
        }

        let schema = self.schema;
        let Some(named_type) = schema.get_type(&ty.name) else {
            return self.error(path, value, format!("Unknown type \"{}\".", ty.name));
        };

        match named_type {
            NamedType::InputObject(input) => {
                let ConstValue::Object(fields) = value else {
                    return self.error(
                        path,
                        value,
                        format!("Expected type \"{}\" to be an object.", input.name),
                    );
                };

                let mut coerced = IndexMap::with_capacity(input.fields.len());

                for field in input.fields.values() {
                    let Some(field_value) = fields.get(&field.name) else {
                        if let Some(default_value) = &field.default_value {
                            coerced.insert(field.name.clone(), default_value.clone());
                        } else if field.ty.is_non_null() {
                            self.error(
                                path,
                                value,
                                format!(
                                    "Field \"{}\" of required type \"{}\" was not provided.",
                                    field.name, field.ty
                                ),
                            );
                        }
                        continue;
                    };

                    path.push(PathSegment::Field(field.name.clone()));
                    let field_value = self.coerce(field_value, &field.ty, path);
                    path.pop();

                    coerced.insert(field.name.clone(), field_value);
                }

                for name in fields.keys() {
                    if !input.fields.contains_key(name) {
                        self.error(
                            path,
                            value,
                            format!("Field \"{name}\" is not defined by type \"{}\".", input.name),
                        );
                    }
                }

                ConstValue::Object(coerced)
            }
            NamedType::Enum(enum_type) => {
                let name = match value {
                    ConstValue::String(name) => name.as_str(),
                    ConstValue::Enum(name) => name.as_str(),
                    _ => {
                        return self.error(
                            path,
                            value,
                            format!(
                                "Enum \"{}\" cannot represent non-string value: {}.",
                                enum_type.name,
                                inspect(value)
                            ),
                        )
                    }
                };

                match enum_type.parse(name) {
                    Some(internal) => internal.clone(),
                    None => self.error(
                        path,
                        value,
                        format!("Value \"{name}\" does not exist in \"{}\" enum.", enum_type.name),
                    ),
                }
            }
            NamedType::Scalar(scalar) => match (scalar.parse_value)(value) {
                Ok(ConstValue::Null) => self.error(path, value, format!("Expected type \"{}\".", scalar.name)),
                Ok(parsed) => parsed,
                Err(message) if is_builtin_scalar(&scalar.name) => self.error(path, value, message),
                Err(message) => self.error(
                    path,
                    value,
                    format!("Expected type \"{}\". {message}", scalar.name),
                ),
            },
            other => self.error(
                path,
                value,
                format!("Type \"{}\" is not an input type.", other.name()),
            ),
        }
    }
}

/// Coerces the arguments of a field or directive. Errors are located at the offending node.
pub(crate) fn coerce_argument_values(
    schema: &Schema,
    definitions: &IndexMap<Name, InputValue>,
    arguments: &[(Positioned<Name>, Positioned<Value>)],
    variables: &VariableValues,
    location: Pos,
) -> Result<ArgumentValues, GraphqlError> {
    let mut coerced = ArgumentValues::with_capacity(definitions.len());

    for definition in definitions.values() {
        let name = &definition.name;
        let ty = &definition.ty;

        let Some((_, value)) = arguments.iter().find(|(argument, _)| &argument.node == name) else {
            if let Some(default_value) = &definition.default_value {
                coerced.insert(name.clone(), default_value.clone());
            } else if ty.is_non_null() {
                return Err(GraphqlError::new(format!(
                    "Argument \"{name}\" of required type \"{ty}\" was not provided."
                ))
                .with_location(location));
            }
            continue;
        };

        let mut is_null = value.node == Value::Null;

        if let Value::Variable(variable) = &value.node {
            let Some(variable_value) = variables.get(variable) else {
                if let Some(default_value) = &definition.default_value {
                    coerced.insert(name.clone(), default_value.clone());
                } else if ty.is_non_null() {
                    return Err(GraphqlError::new(format!(
                        "Argument \"{name}\" of required type \"{ty}\" was provided the variable \"${variable}\" which was not provided a runtime value."
                    ))
                    .with_location(value.pos));
                }
                continue;
            };

            is_null = variable_value == &ConstValue::Null;
        }

        if is_null && ty.is_non_null() {
            return Err(
                GraphqlError::new(format!("Argument \"{name}\" of non-null type \"{ty}\" must not be null."))
                    .with_location(value.pos),
            );
        }

        let Some(coerced_value) = value_from_ast(schema, &value.node, ty, variables) else {
            return Err(
                GraphqlError::new(format!("Argument \"{name}\" has invalid value {}.", value.node))
                    .with_location(value.pos),
            );
        };

        coerced.insert(name.clone(), coerced_value);
    }

    Ok(coerced)
}

fn is_missing_variable(value: &Value, variables: &VariableValues) -> bool {
    matches!(value, Value::Variable(name) if !variables.contains_key(name))
}

/// Coerces a literal against an input type, `None` meaning the literal is invalid.
pub(crate) fn value_from_ast(
    schema: &Schema,
    value: &Value,
    ty: &TypeRef,
    variables: &VariableValues,
) -> Option<ConstValue> {
    if let Value::Variable(name) = value {
        let variable_value = variables.get(name)?;
        if variable_value == &ConstValue::Null && ty.is_non_null() {
            return None;
        }
        return Some(variable_value.clone());
    }

    if ty.is_non_null() {
        if value == &Value::Null {
            return None;
        }
        return value_from_ast(schema, value, &ty.without_non_null(), variables);
    }

    if value == &Value::Null {
        return Some(ConstValue::Null);
    }

    if let Some(item_type) = ty.item_type() {
        let Value::List(items) = value else {
            return value_from_ast(schema, value, &item_type, variables).map(|item| ConstValue::List(vec![item]));
        };

        let mut coerced = Vec::with_capacity(items.len());
        for item in items {
            if is_missing_variable(item, variables) {
                if item_type.is_non_null() {
                    return None;
                }
                coerced.push(ConstValue::Null);
                continue;
            }
            coerced.push(value_from_ast(schema, item, &item_type, variables)?);
        }

        return Some(ConstValue::List(coerced));
    }

    match schema.get_type(&ty.name)? {
        NamedType::InputObject(input) => {
            let Value::Object(fields) = value else {
                return None;
            };

            let mut coerced = IndexMap::with_capacity(input.fields.len());

            for field in input.fields.values() {
                match fields.get(&field.name) {
                    Some(field_value) if !is_missing_variable(field_value, variables) => {
                        let field_value = value_from_ast(schema, field_value, &field.ty, variables)?;
                        coerced.insert(field.name.clone(), field_value);
                    }
                    _ => {
                        if let Some(default_value) = &field.default_value {
                            coerced.insert(field.name.clone(), default_value.clone());
                        } else if field.ty.is_non_null() {
                            return None;
                        }
                    }
                }
            }

            Some(ConstValue::Object(coerced))
        }
        NamedType::Enum(enum_type) => match value {
            Value::Enum(name) => enum_type.parse(name).cloned(),
            _ => None,
        },
        NamedType::Scalar(scalar) => {
            let literal = value
                .clone()
                .into_const_with(|name| variables.get(&name).cloned().ok_or(()))
                .ok()?;

            match (scalar.parse_literal)(&literal) {
                Ok(ConstValue::Null) | Err(_) => None,
                Ok(parsed) => Some(parsed),
            }
        }
        _ => None,
    }
}
