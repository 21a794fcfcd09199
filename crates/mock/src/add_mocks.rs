use std::sync::Arc;

use schema::{
    add_resolvers_to_schema, AddResolversOptions, ConstValue, FieldResult, FieldValue, NamedType, Resolver,
    ResolverContext, ResolverMap, Schema,
};

use crate::{GetArgs, MockError, MockStore, Ref, ROOT_KEY};

#[derive(Debug, Default)]
pub struct AddMocksOptions {
    /// Attached after the mocked resolvers, replacing them. Use it for fields whose mocked value
    /// must be computed, typically by capturing the store.
    pub resolvers: ResolverMap,
    /// Run the resolvers already in the schema first and only fall back to the store when they
    /// return null.
    pub preserve_resolvers: bool,
}

/// Returns a new schema of `store`'s schema whose object fields read from `store`.
///
/// Fields of store entities and of the root types are read from the store, generating values on
/// first read. Fields of plain object values returned by preserved or custom resolvers are read
/// from those objects.
pub fn add_mocks_to_schema(store: Arc<MockStore>, options: AddMocksOptions) -> Result<Schema, MockError> {
    let mut builder = store.schema().to_builder();

    for ty in builder.types_mut().values_mut() {
        let NamedType::Object(object) = ty else {
            continue;
        };

        if object.name.as_str().starts_with("__") {
            continue;
        }

        tracing::trace!(type_name = object.name.as_str(), "mocking fields");

        for field in object.fields.values_mut() {
            let preserved = if options.preserve_resolvers {
                field.resolve.take()
            } else {
                None
            };
            field.resolve = Some(mock_resolver(store.clone(), preserved));
        }
    }

    let schema = builder.finish()?;

    if options.resolvers.is_empty() {
        return Ok(schema);
    }

    Ok(add_resolvers_to_schema(
        &schema,
        &options.resolvers,
        AddResolversOptions::default(),
    )?)
}

fn mock_resolver(store: Arc<MockStore>, preserved: Option<Resolver>) -> Resolver {
    Resolver::new(move |ctx| {
        let store = store.clone();
        let preserved = preserved.clone();

        Box::pin(async move {
            if let Some(resolver) = preserved {
                let value = resolver.call(ctx).await?;
                if !value.is_null() {
                    return Ok(value);
                }
            }

            resolve_from_store(&store, ctx)
        })
    })
}

fn resolve_from_store(store: &MockStore, ctx: ResolverContext<'_>) -> FieldResult<FieldValue> {
    let field_name = ctx.info.field_name;

    if let Some(reference) = ctx.source.downcast_ref::<Ref>() {
        let value = store.get(GetArgs::ref_field(reference, field_name).with_args(ctx.args.clone()))?;
        return Ok(value.into());
    }

    // The root value is not an entity, root fields live on the ROOT entity.
    let parent_type = ctx.info.parent_type.name.as_str();
    if ctx.info.schema.is_root_type(parent_type) {
        let value = store.get(GetArgs::field(parent_type, ROOT_KEY, field_name).with_args(ctx.args.clone()))?;
        return Ok(value.into());
    }

    let value = match ctx.source.as_value() {
        Some(ConstValue::Object(object)) => object.get(field_name).cloned(),
        _ => None,
    };

    Ok(FieldValue::Value(value.unwrap_or(ConstValue::Null)))
}

#[cfg(test)]
mod tests {
    use schema::build_schema;

    use super::*;

    #[test]
    fn object_fields_get_mocked_resolvers() {
        let schema = build_schema("type Query { user: User } type User { id: ID! name: String }").unwrap();
        let store = Arc::new(MockStore::new(schema));

        let mocked = add_mocks_to_schema(store, AddMocksOptions::default()).unwrap();

        let user = mocked.object("User").unwrap();
        assert!(user.fields.values().all(|field| field.resolve.is_some()));
        assert!(mocked.query_type().unwrap().fields["user"].resolve.is_some());
    }

    #[test]
    fn custom_resolvers_must_exist_in_the_schema() {
        let schema = build_schema("type Query { user: String }").unwrap();
        let store = Arc::new(MockStore::new(schema));

        let error = add_mocks_to_schema(
            store,
            AddMocksOptions {
                resolvers: ResolverMap::new().field("Query", "missing", Resolver::sync(|_| Ok(FieldValue::null()))),
                ..Default::default()
            },
        )
        .unwrap_err();

        assert_eq!(error.to_string(), "Query.missing defined in resolvers, but not in schema");
    }
}
