//! Resolver functions and the values flowing through them.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use async_graphql_parser::{types as ast, Positioned};
use async_graphql_value::{ConstValue, Name};
use futures::{future::BoxFuture, stream::BoxStream, Stream, StreamExt};
use indexmap::IndexMap;

use crate::{AbortSignal, ObjectType, ResponsePath, Schema, TypeRef};

pub type FieldResult<T> = Result<T, FieldError>;

/// Request-scoped value shared with every resolver.
pub type ContextValue = dyn Any + Send + Sync;

pub type VariableValues = IndexMap<Name, ConstValue>;

pub type ArgumentValues = IndexMap<Name, ConstValue>;

/// Error returned by a resolver. Anything implementing `Display` converts into it, so
/// resolvers can use `?` on their own errors.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub message: String,
    pub extensions: Option<IndexMap<Name, ConstValue>>,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        FieldError {
            message: message.into(),
            extensions: None,
        }
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl AsRef<str>, value: impl Into<ConstValue>) -> Self {
        self.extensions
            .get_or_insert_with(IndexMap::new)
            .insert(Name::new(key), value.into());
        self
    }
}

impl<T: fmt::Display> From<T> for FieldError {
    fn from(error: T) -> Self {
        FieldError::new(error.to_string())
    }
}

/// Stream of values returned by subscription resolvers and streamed list fields.
pub struct ValueStream(Mutex<BoxStream<'static, FieldResult<FieldValue>>>);

impl ValueStream {
    pub fn into_inner(self) -> BoxStream<'static, FieldResult<FieldValue>> {
        self.0.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ValueStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueStream")
    }
}

/// What a resolver hands back to the executor.
pub enum FieldValue {
    Value(ConstValue),
    List(Vec<FieldValue>),
    /// A value with an explicit runtime object type, used to resolve abstract types.
    Typed {
        type_name: Name,
        value: Box<FieldValue>,
    },
    /// Arbitrary host data only resolvers know how to read.
    Opaque(Arc<dyn Any + Send + Sync>),
    Stream(ValueStream),
}

impl FieldValue {
    pub const fn null() -> Self {
        FieldValue::Value(ConstValue::Null)
    }

    pub fn value(value: impl Into<ConstValue>) -> Self {
        FieldValue::Value(value.into())
    }

    pub fn list(items: impl IntoIterator<Item = FieldValue>) -> Self {
        FieldValue::List(items.into_iter().collect())
    }

    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        FieldValue::Opaque(Arc::new(value))
    }

    pub fn stream(stream: impl Stream<Item = FieldResult<FieldValue>> + Send + 'static) -> Self {
        FieldValue::Stream(ValueStream(Mutex::new(stream.boxed())))
    }

    #[must_use]
    pub fn with_type(self, type_name: impl AsRef<str>) -> Self {
        FieldValue::Typed {
            type_name: Name::new(type_name),
            value: Box::new(self.into_inner()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.inner(), FieldValue::Value(ConstValue::Null))
    }

    /// Runtime type set through [`FieldValue::with_type`].
    pub fn type_name(&self) -> Option<&Name> {
        match self {
            FieldValue::Typed { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    pub fn inner(&self) -> &FieldValue {
        match self {
            FieldValue::Typed { value, .. } => value.inner(),
            value => value,
        }
    }

    pub fn into_inner(self) -> FieldValue {
        match self {
            FieldValue::Typed { value, .. } => value.into_inner(),
            value => value,
        }
    }

    pub fn as_value(&self) -> Option<&ConstValue> {
        match self.inner() {
            FieldValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self.inner() {
            FieldValue::Opaque(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            FieldValue::Value(value) => crate::inspect(value),
            FieldValue::List(items) => format!("<list of {} items>", items.len()),
            FieldValue::Opaque(_) => "<opaque value>".to_string(),
            FieldValue::Stream(_) => "<stream>".to_string(),
            FieldValue::Typed { value, .. } => value.describe(),
        }
    }
}

impl From<ConstValue> for FieldValue {
    fn from(value: ConstValue) -> Self {
        FieldValue::Value(value)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldValue::List(items) => f.debug_tuple("List").field(items).finish(),
            FieldValue::Typed { type_name, value } => f
                .debug_struct("Typed")
                .field("type_name", type_name)
                .field("value", value)
                .finish(),
            FieldValue::Opaque(_) => f.write_str("Opaque"),
            FieldValue::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// Information about the field being resolved.
pub struct ResolveInfo<'a> {
    pub field_name: &'a str,
    pub field_nodes: &'a [&'a Positioned<ast::Field>],
    pub return_type: &'a TypeRef,
    pub parent_type: &'a ObjectType,
    pub path: &'a ResponsePath,
    pub schema: &'a Schema,
    pub fragments: &'a HashMap<Name, Positioned<ast::FragmentDefinition>>,
    pub root_value: &'a FieldValue,
    pub operation: &'a Positioned<ast::OperationDefinition>,
    pub variable_values: &'a VariableValues,
    pub signal: &'a AbortSignal,
}

#[derive(Clone, Copy)]
pub struct ResolverContext<'a> {
    pub source: &'a FieldValue,
    pub args: &'a ArgumentValues,
    pub context: &'a ContextValue,
    pub info: &'a ResolveInfo<'a>,
}

impl<'a> ResolverContext<'a> {
    pub fn arg(&self, name: &str) -> Option<&'a ConstValue> {
        self.args.get(name)
    }

    /// Downcasts the request context value.
    pub fn data<T: Any>(&self) -> Option<&'a T> {
        self.context.downcast_ref::<T>()
    }
}

/// Arguments of type resolvers and `isTypeOf` checks.
#[derive(Clone, Copy)]
pub struct TypeResolverContext<'a> {
    pub value: &'a FieldValue,
    pub context: &'a ContextValue,
    pub info: &'a ResolveInfo<'a>,
    pub abstract_type: &'a str,
}

type ResolverFn = dyn for<'a> Fn(ResolverContext<'a>) -> BoxFuture<'a, FieldResult<FieldValue>> + Send + Sync;

/// Field resolver, also used for subscription `subscribe` functions.
#[derive(Clone)]
pub struct Resolver(Arc<ResolverFn>);

impl Resolver {
    pub fn new<F>(resolve: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> BoxFuture<'a, FieldResult<FieldValue>> + Send + Sync + 'static,
    {
        Resolver(Arc::new(resolve))
    }

    pub fn sync<F>(resolve: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldResult<FieldValue> + Send + Sync + 'static,
    {
        Self::new(move |ctx| Box::pin(futures::future::ready(resolve(ctx))))
    }

    pub fn call<'a>(&self, ctx: ResolverContext<'a>) -> BoxFuture<'a, FieldResult<FieldValue>> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver")
    }
}

type TypeResolverFn =
    dyn for<'a> Fn(TypeResolverContext<'a>) -> BoxFuture<'a, FieldResult<Option<String>>> + Send + Sync;

/// Finds the runtime object type name of a value of an abstract type.
#[derive(Clone)]
pub struct TypeResolver(Arc<TypeResolverFn>);

impl TypeResolver {
    pub fn new<F>(resolve: F) -> Self
    where
        F: for<'a> Fn(TypeResolverContext<'a>) -> BoxFuture<'a, FieldResult<Option<String>>> + Send + Sync + 'static,
    {
        TypeResolver(Arc::new(resolve))
    }

    pub fn sync<F>(resolve: F) -> Self
    where
        F: for<'a> Fn(TypeResolverContext<'a>) -> FieldResult<Option<String>> + Send + Sync + 'static,
    {
        Self::new(move |ctx| Box::pin(futures::future::ready(resolve(ctx))))
    }

    pub fn call<'a>(&self, ctx: TypeResolverContext<'a>) -> BoxFuture<'a, FieldResult<Option<String>>> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for TypeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeResolver")
    }
}

type IsTypeOfFn = dyn for<'a> Fn(TypeResolverContext<'a>) -> BoxFuture<'a, FieldResult<bool>> + Send + Sync;

/// Checks whether a value belongs to an object type.
#[derive(Clone)]
pub struct IsTypeOf(Arc<IsTypeOfFn>);

impl IsTypeOf {
    pub fn new<F>(check: F) -> Self
    where
        F: for<'a> Fn(TypeResolverContext<'a>) -> BoxFuture<'a, FieldResult<bool>> + Send + Sync + 'static,
    {
        IsTypeOf(Arc::new(check))
    }

    pub fn sync<F>(check: F) -> Self
    where
        F: for<'a> Fn(TypeResolverContext<'a>) -> FieldResult<bool> + Send + Sync + 'static,
    {
        Self::new(move |ctx| Box::pin(futures::future::ready(check(ctx))))
    }

    pub fn call<'a>(&self, ctx: TypeResolverContext<'a>) -> BoxFuture<'a, FieldResult<bool>> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for IsTypeOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IsTypeOf")
    }
}
