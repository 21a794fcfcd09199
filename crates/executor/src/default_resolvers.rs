use schema::{ConstValue, FieldResult, FieldValue, ResolverContext};

/// Reads the property named like the field from an object source, `null` otherwise.
pub(crate) fn default_field_resolver(ctx: ResolverContext<'_>) -> FieldResult<FieldValue> {
    let value = match ctx.source.as_value() {
        Some(ConstValue::Object(object)) => object.get(ctx.info.field_name).cloned(),
        _ => None,
    };

    Ok(FieldValue::Value(value.unwrap_or(ConstValue::Null)))
}
