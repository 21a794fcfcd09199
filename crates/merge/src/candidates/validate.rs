//! Consistency checks between the merged definition of a field and every candidate definition.

use itertools::Itertools;
use schema::{Field, InputValue, TypeRef};

use super::{MergeFieldCandidate, MergeTypeCandidate};
use crate::{MergeError, TypeMergingOptions, ValidationLevel};

pub(super) fn validate_field_consistency(
    field: &Field,
    candidates: &[MergeFieldCandidate<'_, Field>],
    options: &TypeMergingOptions,
) -> Result<(), MergeError> {
    let Some(first) = candidates.first() else {
        return Ok(());
    };
    let namespace = format!("{}.{}", first.type_name, first.field_name);

    validate_type_consistency(
        &field.ty,
        candidates.iter().map(|candidate| &candidate.config.ty),
        "field",
        &namespace,
        options,
    )?;

    let is_non_null = field.ty.is_non_null();
    if options.validation_settings(&namespace).is_strict_null_comparison() {
        if candidates
            .iter()
            .any(|candidate| candidate.config.ty.is_non_null() != is_non_null)
        {
            report(
                format!("Nullability of field \"{namespace}\" does not match across subschemas. Disable validationSettings.strictNullComparison to permit safe divergence."),
                &namespace,
                options,
            )?;
        }
    } else if is_non_null && candidates.iter().any(|candidate| !candidate.config.ty.is_non_null()) {
        advise(
            format!("Canonical definition of field \"{namespace}\" is not-null while some subschemas permit null."),
            &namespace,
            options,
        );
    }

    let argument_names = candidates
        .iter()
        .flat_map(|candidate| candidate.config.arguments.keys())
        .unique()
        .collect::<Vec<_>>();

    let inconsistent_arguments = argument_names.iter().any(|name| {
        candidates
            .iter()
            .any(|candidate| !candidate.config.arguments.contains_key(*name))
    });

    if inconsistent_arguments {
        let message = format!(
            "Canonical definition of field \"{namespace}\" implements inconsistent argument names across subschemas. Input may be filtered from some requests."
        );

        if options.validation_settings(&namespace).is_strict_null_comparison() {
            report(message, &namespace, options)?;
        } else {
            advise(message, &namespace, options);
        }
    }

    for (argument_name, argument) in &field.arguments {
        let namespace = format!("{namespace}.{argument_name}");
        let definitions = candidates
            .iter()
            .filter_map(|candidate| candidate.config.arguments.get(argument_name))
            .collect::<Vec<_>>();

        validate_input_value(argument, &definitions, "argument", &namespace, options)?;
    }

    Ok(())
}

pub(super) fn validate_input_field_consistency(
    field: &InputValue,
    candidates: &[MergeFieldCandidate<'_, InputValue>],
    options: &TypeMergingOptions,
) -> Result<(), MergeError> {
    let Some(first) = candidates.first() else {
        return Ok(());
    };
    let namespace = format!("{}.{}", first.type_name, first.field_name);
    let definitions = candidates.iter().map(|candidate| candidate.config).collect::<Vec<_>>();

    validate_input_value(field, &definitions, "input field", &namespace, options)
}

/// An input field missing from some definitions of its input type can't be forwarded to all of
/// them.
pub(super) fn validate_input_field_inclusion(
    type_name: &str,
    field_name: &str,
    inclusions: usize,
    candidates: usize,
    options: &TypeMergingOptions,
) -> Result<(), MergeError> {
    if inclusions == candidates {
        return Ok(());
    }

    let namespace = format!("{type_name}.{field_name}");

    report(
        format!("Definition of input field \"{namespace}\" is not included in all schemas that define input type \"{type_name}\". Requests that include this field will fail for some subschemas."),
        &namespace,
        options,
    )
}

/// Enums used as input types should accept the same values everywhere. Only a warning, as output
/// enums may diverge safely.
pub(super) fn validate_enum_consistency(
    type_name: &str,
    candidates: &[MergeTypeCandidate],
    options: &TypeMergingOptions,
) {
    let value_sets = candidates
        .iter()
        .filter_map(|candidate| candidate.ty.as_enum())
        .map(|enum_type| enum_type.values.keys().map(|name| name.as_str()).sorted().collect::<Vec<_>>())
        .collect::<Vec<_>>();

    if value_sets.iter().all_equal() {
        return;
    }

    advise(
        format!("Enum \"{type_name}\" does not define the same values in all subschemas. Values missing from some subschemas will fail as input there."),
        type_name,
        options,
    );
}

fn validate_input_value(
    value: &InputValue,
    definitions: &[&InputValue],
    kind: &str,
    namespace: &str,
    options: &TypeMergingOptions,
) -> Result<(), MergeError> {
    validate_type_consistency(
        &value.ty,
        definitions.iter().map(|definition| &definition.ty),
        kind,
        namespace,
        options,
    )?;

    let is_non_null = value.ty.is_non_null();
    if options.validation_settings(namespace).is_strict_null_comparison() {
        if definitions.iter().any(|definition| definition.ty.is_non_null() != is_non_null) {
            report(
                format!("Nullability of {kind} \"{namespace}\" does not match across subschemas. Disable validationSettings.strictNullComparison to permit safe divergence."),
                namespace,
                options,
            )?;
        }
    } else if !is_non_null && definitions.iter().any(|definition| definition.ty.is_non_null()) {
        advise(
            format!("Canonical definition of {kind} \"{namespace}\" permits null while some subschemas require not-null."),
            namespace,
            options,
        );
    }

    Ok(())
}

/// Lists can never be reconciled. Named types can, at the configured validation level, or
/// silently for proxiable scalars.
fn validate_type_consistency<'a>(
    merged: &TypeRef,
    types: impl Iterator<Item = &'a TypeRef>,
    kind: &str,
    namespace: &str,
    options: &TypeMergingOptions,
) -> Result<(), MergeError> {
    let settings = options.validation_settings(namespace);
    let mut inconsistent_names = false;

    for ty in types {
        if ty.wrapping.list_depth() != merged.wrapping.list_depth() {
            return Err(MergeError::Validation(format!(
                "Definitions of {kind} \"{namespace}\" implement inconsistent list types across subschemas and cannot be merged."
            )));
        }

        if ty.name != merged.name && !settings.is_proxiable(&merged.name, &ty.name) {
            inconsistent_names = true;
        }
    }

    if inconsistent_names {
        report(
            format!("Definitions of {kind} \"{namespace}\" implement inconsistent named types across subschemas. This results in runtime type mismatches."),
            namespace,
            options,
        )?;
    }

    Ok(())
}

/// Fails, warns or stays silent depending on the validation level of `namespace`.
fn report(message: String, namespace: &str, options: &TypeMergingOptions) -> Result<(), MergeError> {
    match options.validation_settings(namespace).level() {
        ValidationLevel::Off => Ok(()),
        ValidationLevel::Warn => {
            advise(message, namespace, options);
            Ok(())
        }
        ValidationLevel::Error => Err(MergeError::Validation(format!(
            "{message} To disable this error or demote it to a warning, set validationScopes[\"{namespace}\"].validationLevel."
        ))),
    }
}

/// Warns unless validation is turned off for `namespace`.
fn advise(message: String, namespace: &str, options: &TypeMergingOptions) {
    if options.validation_settings(namespace).level() == ValidationLevel::Off {
        return;
    }

    tracing::warn!(
        namespace,
        "{message} To disable this warning or promote it to an error, set validationScopes[\"{namespace}\"].validationLevel."
    );
}

#[cfg(test)]
mod tests {
    use schema::{NamedType, ObjectType};

    use crate::{merge_candidates, ValidationSettings};

    use super::*;

    fn product(ty: &str) -> MergeTypeCandidate {
        MergeTypeCandidate::new(NamedType::Object(
            ObjectType::new("Product").field(Field::new("price", TypeRef::parse(ty).unwrap())),
        ))
    }

    fn options(level: ValidationLevel) -> TypeMergingOptions {
        TypeMergingOptions {
            validation_settings: ValidationSettings {
                validation_level: Some(level),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn list_mismatch_is_always_fatal() {
        let error = merge_candidates(
            "Product",
            vec![product("[Float]"), product("Float")],
            &options(ValidationLevel::Off),
        )
        .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Definitions of field \"Product.price\" implement inconsistent list types across subschemas and cannot be merged."
        );
    }

    #[test]
    fn named_type_mismatch_follows_the_validation_level() {
        let error = merge_candidates(
            "Product",
            vec![product("Float"), product("Int")],
            &TypeMergingOptions::default(),
        )
        .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Definitions of field \"Product.price\" implement inconsistent named types across subschemas. This results in runtime type mismatches. To disable this error or demote it to a warning, set validationScopes[\"Product.price\"].validationLevel."
        );

        for level in [ValidationLevel::Warn, ValidationLevel::Off] {
            let merged = merge_candidates("Product", vec![product("Float"), product("Int")], &options(level)).unwrap();
            assert_eq!(merged.fields().unwrap()["price"].ty.to_string(), "Int");
        }
    }

    #[test]
    fn proxiable_scalars_are_allowed() {
        let options = TypeMergingOptions::from_toml(
            r#"
            [validationSettings]
            proxiableScalars = { ID = ["String"] }
            "#,
        )
        .unwrap();

        let merged = merge_candidates("Product", vec![product("String"), product("ID")], &options).unwrap();
        assert_eq!(merged.fields().unwrap()["price"].ty.to_string(), "ID");
    }

    #[test]
    fn nullability_is_strict_on_request() {
        let merged = merge_candidates(
            "Product",
            vec![product("Float"), product("Float!")],
            &TypeMergingOptions::default(),
        )
        .unwrap();
        assert_eq!(merged.fields().unwrap()["price"].ty.to_string(), "Float!");

        let options = TypeMergingOptions::from_toml(
            r#"
            [validationScopes."Product.price"]
            strictNullComparison = true
            "#,
        )
        .unwrap();

        let error = merge_candidates("Product", vec![product("Float"), product("Float!")], &options).unwrap_err();
        assert!(error
            .to_string()
            .starts_with("Nullability of field \"Product.price\" does not match across subschemas."));
    }

    #[test]
    fn input_fields_must_be_included_everywhere() {
        let input = |fields: &[&str]| {
            let mut input = schema::InputObjectType::new("Filter");
            for field in fields {
                input = input.field(InputValue::new(field, TypeRef::named("String")));
            }
            MergeTypeCandidate::new(NamedType::InputObject(input))
        };

        let error = merge_candidates(
            "Filter",
            vec![input(&["name"]), input(&["name", "tag"])],
            &TypeMergingOptions::default(),
        )
        .unwrap_err();

        assert!(error.to_string().starts_with(
            "Definition of input field \"Filter.tag\" is not included in all schemas that define input type \"Filter\"."
        ));

        let merged = merge_candidates(
            "Filter",
            vec![input(&["name"]), input(&["name", "tag"])],
            &options(ValidationLevel::Warn),
        )
        .unwrap();
        assert_eq!(merged.as_input_object().unwrap().fields.len(), 2);
    }
}
