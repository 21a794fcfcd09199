//! Typed resolver maps and their attachment to a schema.

use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;

use crate::{IsTypeOf, NamedType, Resolver, ScalarType, Schema, SchemaBuilder, SchemaError, TypeResolver};

/// Resolvers keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct ResolverMap {
    /// Field resolvers of objects and interfaces, plus type resolution of abstract types.
    pub objects: IndexMap<String, ObjectResolvers>,
    /// Replacement implementations of custom scalars.
    pub scalars: IndexMap<String, ScalarType>,
    /// Internal values of enum members.
    pub enums: IndexMap<String, IndexMap<String, ConstValue>>,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectResolvers {
    pub fields: IndexMap<String, FieldResolvers>,
    pub is_type_of: Option<IsTypeOf>,
    pub resolve_type: Option<TypeResolver>,
}

#[derive(Debug, Clone, Default)]
pub struct FieldResolvers {
    pub resolve: Option<Resolver>,
    pub subscribe: Option<Resolver>,
}

impl FieldResolvers {
    fn merge(&mut self, other: FieldResolvers) {
        if other.resolve.is_some() {
            self.resolve = other.resolve;
        }
        if other.subscribe.is_some() {
            self.subscribe = other.subscribe;
        }
    }
}

impl ObjectResolvers {
    fn merge(&mut self, other: ObjectResolvers) {
        for (name, field) in other.fields {
            self.fields.entry(name).or_default().merge(field);
        }
        if other.is_type_of.is_some() {
            self.is_type_of = other.is_type_of;
        }
        if other.resolve_type.is_some() {
            self.resolve_type = other.resolve_type;
        }
    }
}

impl ResolverMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.scalars.is_empty() && self.enums.is_empty()
    }

    fn object(&mut self, type_name: &str) -> &mut ObjectResolvers {
        self.objects.entry(type_name.to_string()).or_default()
    }

    #[must_use]
    pub fn field(mut self, type_name: &str, field_name: &str, resolver: Resolver) -> Self {
        self.object(type_name)
            .fields
            .entry(field_name.to_string())
            .or_default()
            .resolve = Some(resolver);
        self
    }

    /// Subscription root field: `subscribe` produces the source event stream, `resolve`
    /// optionally maps every event.
    #[must_use]
    pub fn subscription(
        mut self,
        type_name: &str,
        field_name: &str,
        subscribe: Resolver,
        resolve: Option<Resolver>,
    ) -> Self {
        let field = self
            .object(type_name)
            .fields
            .entry(field_name.to_string())
            .or_default();
        field.subscribe = Some(subscribe);
        if resolve.is_some() {
            field.resolve = resolve;
        }
        self
    }

    #[must_use]
    pub fn is_type_of(mut self, type_name: &str, is_type_of: IsTypeOf) -> Self {
        self.object(type_name).is_type_of = Some(is_type_of);
        self
    }

    #[must_use]
    pub fn resolve_type(mut self, type_name: &str, resolve_type: TypeResolver) -> Self {
        self.object(type_name).resolve_type = Some(resolve_type);
        self
    }

    #[must_use]
    pub fn scalar(mut self, scalar: ScalarType) -> Self {
        self.scalars.insert(scalar.name.to_string(), scalar);
        self
    }

    #[must_use]
    pub fn enum_values<K: Into<String>>(
        mut self,
        type_name: &str,
        values: impl IntoIterator<Item = (K, ConstValue)>,
    ) -> Self {
        self.enums
            .entry(type_name.to_string())
            .or_default()
            .extend(values.into_iter().map(|(name, value)| (name.into(), value)));
        self
    }

    /// Deep merge, entries of `other` winning over entries of `self`.
    pub fn merge(&mut self, other: ResolverMap) {
        for (type_name, resolvers) in other.objects {
            self.objects.entry(type_name).or_default().merge(resolvers);
        }
        self.scalars.extend(other.scalars);
        for (type_name, values) in other.enums {
            self.enums.entry(type_name).or_default().extend(values);
        }
    }
}

/// Controls how unknown entries of a resolver map are treated.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddResolversOptions {
    /// Skip resolvers for types or fields the schema doesn't define instead of failing.
    pub ignore_unknown: bool,
    /// Keep existing field resolvers, only filling the gaps.
    pub keep_existing: bool,
}

/// Returns a new schema with the resolvers of `resolvers` attached. The input schema is left
/// untouched.
pub fn add_resolvers_to_schema(
    schema: &Schema,
    resolvers: &ResolverMap,
    options: AddResolversOptions,
) -> Result<Schema, SchemaError> {
    let mut builder = schema.to_builder();

    for (type_name, resolvers) in &resolvers.objects {
        let Some(ty) = known_type(&mut builder, type_name, options)? else {
            continue;
        };

        match ty {
            NamedType::Object(object) => {
                attach_fields(type_name, &mut object.fields, resolvers, options)?;
                if resolvers.is_type_of.is_some() {
                    object.is_type_of.clone_from(&resolvers.is_type_of);
                }
            }
            NamedType::Interface(interface) => {
                attach_fields(type_name, &mut interface.fields, resolvers, options)?;
                if resolvers.resolve_type.is_some() {
                    interface.resolve_type.clone_from(&resolvers.resolve_type);
                }
            }
            NamedType::Union(union) if resolvers.fields.is_empty() => {
                if resolvers.resolve_type.is_some() {
                    union.resolve_type.clone_from(&resolvers.resolve_type);
                }
            }
            other => return Err(mismatch(type_name, other)),
        }
    }

    for (type_name, implementation) in &resolvers.scalars {
        let Some(ty) = known_type(&mut builder, type_name, options)? else {
            continue;
        };

        let scalar = match ty {
            NamedType::Scalar(scalar) => scalar,
            other => return Err(mismatch(type_name, other)),
        };

        let mut implementation = implementation.clone();
        implementation.name = scalar.name.clone();
        implementation.description = implementation.description.or_else(|| scalar.description.take());
        implementation.specified_by_url = implementation
            .specified_by_url
            .or_else(|| scalar.specified_by_url.take());
        implementation.directives = std::mem::take(&mut scalar.directives);
        implementation.ast_node = scalar.ast_node.take();
        implementation.extension_ast_nodes = std::mem::take(&mut scalar.extension_ast_nodes);
        *scalar = implementation;
    }

    for (type_name, values) in &resolvers.enums {
        let Some(ty) = known_type(&mut builder, type_name, options)? else {
            continue;
        };

        let enum_type = match ty {
            NamedType::Enum(enum_type) => enum_type,
            other => return Err(mismatch(type_name, other)),
        };

        for (name, value) in values {
            match enum_type.values.get_mut(name.as_str()) {
                Some(enum_value) => enum_value.value = value.clone(),
                None if options.ignore_unknown => {}
                None => {
                    return Err(SchemaError::UnknownResolverEnumValue {
                        type_name: type_name.clone(),
                        value: name.clone(),
                    })
                }
            }
        }
    }

    builder.finish()
}

fn known_type<'a>(
    builder: &'a mut SchemaBuilder,
    type_name: &str,
    options: AddResolversOptions,
) -> Result<Option<&'a mut NamedType>, SchemaError> {
    match builder.type_mut(type_name) {
        Some(ty) => Ok(Some(ty)),
        None if options.ignore_unknown => {
            tracing::debug!(type_name, "skipping resolvers of unknown type");
            Ok(None)
        }
        None => Err(SchemaError::UnknownResolverType(type_name.to_string())),
    }
}

fn mismatch(type_name: &str, ty: &NamedType) -> SchemaError {
    SchemaError::ResolverKindMismatch {
        type_name: type_name.to_string(),
        category: ty.category(),
    }
}

fn attach_fields(
    type_name: &str,
    fields: &mut IndexMap<Name, crate::Field>,
    resolvers: &ObjectResolvers,
    options: AddResolversOptions,
) -> Result<(), SchemaError> {
    for (field_name, field_resolvers) in &resolvers.fields {
        let Some(field) = fields.get_mut(field_name.as_str()) else {
            if options.ignore_unknown {
                continue;
            }
            return Err(SchemaError::UnknownResolverField {
                type_name: type_name.to_string(),
                field_name: field_name.clone(),
            });
        };

        if field_resolvers.resolve.is_some() && !(options.keep_existing && field.resolve.is_some()) {
            field.resolve.clone_from(&field_resolvers.resolve);
        }
        if field_resolvers.subscribe.is_some() && !(options.keep_existing && field.subscribe.is_some()) {
            field.subscribe.clone_from(&field_resolvers.subscribe);
        }
    }

    Ok(())
}
