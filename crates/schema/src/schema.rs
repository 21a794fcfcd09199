use std::{collections::HashMap, ops::Deref, sync::Arc};

use async_graphql_parser::{
    types::{self as ast, DirectiveLocation, OperationType},
    Positioned,
};
use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;

use crate::{
    scalars::builtin_scalars, validate, DirectiveDefinition, Extensions, InputValue, NamedType, ObjectType,
    SchemaError, TypeRef,
};

pub const BUILTIN_DIRECTIVES: [&str; 6] = ["skip", "include", "deprecated", "specifiedBy", "defer", "stream"];

pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Schema builder
#[derive(Clone, Default)]
pub struct SchemaBuilder {
    description: Option<String>,
    types: IndexMap<Name, NamedType>,
    query_type: Option<Name>,
    mutation_type: Option<Name>,
    subscription_type: Option<Name>,
    directives: IndexMap<Name, DirectiveDefinition>,
    schema_directives: Vec<crate::Directive>,
    ast_node: Option<Positioned<ast::SchemaDefinition>>,
    extension_ast_nodes: Vec<Positioned<ast::SchemaDefinition>>,
    extensions: Extensions,
    assume_valid: bool,
}

impl SchemaBuilder {
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the name of the query root type.
    #[must_use]
    pub fn query_type(mut self, name: impl AsRef<str>) -> Self {
        self.query_type = Some(Name::new(name));
        self
    }

    #[must_use]
    pub fn mutation_type(mut self, name: impl AsRef<str>) -> Self {
        self.mutation_type = Some(Name::new(name));
        self
    }

    #[must_use]
    pub fn subscription_type(mut self, name: impl AsRef<str>) -> Self {
        self.subscription_type = Some(Name::new(name));
        self
    }

    /// Register a type, replacing any type with the same name.
    #[must_use]
    pub fn register_type(mut self, ty: NamedType) -> Self {
        self.types.insert(ty.name().clone(), ty);
        self
    }

    #[must_use]
    pub fn register_directive(mut self, directive: DirectiveDefinition) -> Self {
        self.directives.insert(directive.name.clone(), directive);
        self
    }

    #[must_use]
    pub fn schema_directive(mut self, directive: crate::Directive) -> Self {
        self.schema_directives.push(directive);
        self
    }

    #[must_use]
    pub fn ast_node(mut self, node: Option<Positioned<ast::SchemaDefinition>>) -> Self {
        self.ast_node = node;
        self
    }

    #[must_use]
    pub fn extension_ast_node(mut self, node: Positioned<ast::SchemaDefinition>) -> Self {
        self.extension_ast_nodes.push(node);
        self
    }

    #[must_use]
    pub fn extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Skip validation when finishing. Execution of an invalid schema is undefined.
    #[must_use]
    pub fn assume_valid(mut self) -> Self {
        self.assume_valid = true;
        self
    }

    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    pub fn type_mut(&mut self, name: &str) -> Option<&mut NamedType> {
        self.types.get_mut(name)
    }

    pub fn types_mut(&mut self) -> &mut IndexMap<Name, NamedType> {
        &mut self.types
    }

    /// Build schema.
    pub fn finish(self) -> Result<Schema, SchemaError> {
        let SchemaBuilder {
            description,
            mut types,
            query_type,
            mutation_type,
            subscription_type,
            mut directives,
            schema_directives,
            ast_node,
            extension_ast_nodes,
            extensions,
            assume_valid,
        } = self;

        for scalar in builtin_scalars() {
            if !types.contains_key(&scalar.name) {
                types.insert(scalar.name.clone(), NamedType::Scalar(scalar));
            }
        }

        for directive in builtin_directives() {
            if !directives.contains_key(&directive.name) {
                directives.insert(directive.name.clone(), directive);
            }
        }

        let possible_types = compute_possible_types(&types);

        let inner = SchemaInner {
            description,
            types,
            query_type,
            mutation_type,
            subscription_type,
            directives,
            schema_directives,
            ast_node,
            extension_ast_nodes,
            extensions,
            possible_types,
        };

        if !assume_valid {
            let errors = validate::validate_schema(&inner);
            if !errors.is_empty() {
                return Err(SchemaError::Invalid(errors));
            }
        }

        tracing::debug!(types = inner.types.len(), "schema built");

        Ok(Schema(Arc::new(inner)))
    }
}

/// An immutable, cheaply clonable GraphQL schema.
#[derive(Debug, Clone)]
pub struct Schema(Arc<SchemaInner>);

#[derive(Debug)]
pub struct SchemaInner {
    pub description: Option<String>,
    pub types: IndexMap<Name, NamedType>,
    pub query_type: Option<Name>,
    pub mutation_type: Option<Name>,
    pub subscription_type: Option<Name>,
    pub directives: IndexMap<Name, DirectiveDefinition>,
    pub schema_directives: Vec<crate::Directive>,
    pub ast_node: Option<Positioned<ast::SchemaDefinition>>,
    pub extension_ast_nodes: Vec<Positioned<ast::SchemaDefinition>>,
    pub extensions: Extensions,
    /// Object types per abstract type, computed once per build.
    possible_types: HashMap<Name, Vec<Name>>,
}

impl Deref for Schema {
    type Target = SchemaInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// A builder holding a copy of this schema, to derive a new schema from it.
    pub fn to_builder(&self) -> SchemaBuilder {
        SchemaBuilder {
            description: self.description.clone(),
            types: self.types.clone(),
            query_type: self.query_type.clone(),
            mutation_type: self.mutation_type.clone(),
            subscription_type: self.subscription_type.clone(),
            directives: self.directives.clone(),
            schema_directives: self.schema_directives.clone(),
            ast_node: self.ast_node.clone(),
            extension_ast_nodes: self.extension_ast_nodes.clone(),
            extensions: self.extensions.clone(),
            assume_valid: false,
        }
    }

    /// Whether both values are the same schema instance.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl SchemaInner {
    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.get_type(name).and_then(NamedType::as_object)
    }

    pub fn query_type(&self) -> Option<&ObjectType> {
        self.query_type.as_deref().and_then(|name| self.object(name))
    }

    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.mutation_type.as_deref().and_then(|name| self.object(name))
    }

    pub fn subscription_type(&self) -> Option<&ObjectType> {
        self.subscription_type.as_deref().and_then(|name| self.object(name))
    }

    pub fn root_type_name(&self, operation: OperationType) -> Option<&Name> {
        match operation {
            OperationType::Query => self.query_type.as_ref(),
            OperationType::Mutation => self.mutation_type.as_ref(),
            OperationType::Subscription => self.subscription_type.as_ref(),
        }
    }

    pub fn root_type(&self, operation: OperationType) -> Option<&ObjectType> {
        self.root_type_name(operation).and_then(|name| self.object(name))
    }

    pub fn is_root_type(&self, name: &str) -> bool {
        [&self.query_type, &self.mutation_type, &self.subscription_type]
            .into_iter()
            .any(|root| root.as_deref() == Some(name))
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.get(name)
    }

    /// Object types that can be the runtime type of an abstract type, in schema order.
    pub fn possible_types(&self, abstract_type: &str) -> &[Name] {
        self.possible_types
            .get(abstract_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_possible_type(&self, abstract_type: &str, object_type: &str) -> bool {
        self.possible_types(abstract_type)
            .iter()
            .any(|name| name == object_type)
    }

    /// Whether `maybe_sub_type` is a member of the union or an implementation of the interface,
    /// including interfaces implementing `abstract_type`.
    pub fn is_sub_type(&self, abstract_type: &str, maybe_sub_type: &str) -> bool {
        match self.get_type(maybe_sub_type) {
            Some(NamedType::Object(object)) => {
                self.is_possible_type(abstract_type, maybe_sub_type)
                    || object.interfaces.iter().any(|name| name == abstract_type)
            }
            Some(NamedType::Interface(interface)) => interface.interfaces.iter().any(|name| name == abstract_type),
            _ => false,
        }
    }

    /// Covariant type comparison used for interface field compatibility.
    pub fn is_type_sub_type_of(&self, maybe_sub_type: &TypeRef, super_type: &TypeRef) -> bool {
        if maybe_sub_type == super_type {
            return true;
        }

        if super_type.is_non_null() {
            return maybe_sub_type.is_non_null()
                && self.is_type_sub_type_of(&maybe_sub_type.without_non_null(), &super_type.without_non_null());
        }

        if maybe_sub_type.is_non_null() {
            return self.is_type_sub_type_of(&maybe_sub_type.without_non_null(), super_type);
        }

        match (maybe_sub_type.item_type(), super_type.item_type()) {
            (Some(sub_item), Some(super_item)) => self.is_type_sub_type_of(&sub_item, &super_item),
            (None, None) => {
                maybe_sub_type.name == super_type.name
                    || (self
                        .get_type(&super_type.name)
                        .is_some_and(NamedType::is_abstract)
                        && self.is_sub_type(&super_type.name, &maybe_sub_type.name))
            }
            _ => false,
        }
    }
}

fn compute_possible_types(types: &IndexMap<Name, NamedType>) -> HashMap<Name, Vec<Name>> {
    let mut possible_types: HashMap<Name, Vec<Name>> = HashMap::new();

    for ty in types.values() {
        match ty {
            NamedType::Union(union) => {
                possible_types
                    .entry(union.name.clone())
                    .or_default()
                    .extend(union.members.iter().cloned());
            }
            NamedType::Object(object) => {
                for interface in &object.interfaces {
                    possible_types
                        .entry(interface.clone())
                        .or_default()
                        .push(object.name.clone());
                }
            }
            _ => {}
        }
    }

    possible_types
}

pub fn is_builtin_directive(name: &str) -> bool {
    BUILTIN_DIRECTIVES.contains(&name)
}

fn builtin_directives() -> Vec<DirectiveDefinition> {
    let boolean = || TypeRef::non_null("Boolean");

    let mut skip = DirectiveDefinition::new(
        "skip",
        [
            DirectiveLocation::Field,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
        ],
    )
    .argument(InputValue::new("if", boolean()));
    skip.description = Some("Directs the executor to skip this field or fragment when the `if` argument is true.".into());

    let mut include = DirectiveDefinition::new(
        "include",
        [
            DirectiveLocation::Field,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
        ],
    )
    .argument(InputValue::new("if", boolean()));
    include.description =
        Some("Directs the executor to include this field or fragment only when the `if` argument is true.".into());

    let mut deprecated = DirectiveDefinition::new(
        "deprecated",
        [
            DirectiveLocation::FieldDefinition,
            DirectiveLocation::ArgumentDefinition,
            DirectiveLocation::InputFieldDefinition,
            DirectiveLocation::EnumValue,
        ],
    )
    .argument(
        InputValue::new("reason", TypeRef::named("String")).default_value(ConstValue::from(DEFAULT_DEPRECATION_REASON)),
    );
    deprecated.description = Some("Marks an element of a GraphQL schema as no longer supported.".into());

    let specified_by = DirectiveDefinition::new("specifiedBy", [DirectiveLocation::Scalar])
        .argument(InputValue::new("url", TypeRef::non_null("String")));

    let defer = DirectiveDefinition::new(
        "defer",
        [DirectiveLocation::FragmentSpread, DirectiveLocation::InlineFragment],
    )
    .argument(InputValue::new("if", boolean()).default_value(true))
    .argument(InputValue::new("label", TypeRef::named("String")));

    let stream = DirectiveDefinition::new("stream", [DirectiveLocation::Field])
        .argument(InputValue::new("if", boolean()).default_value(true))
        .argument(InputValue::new("label", TypeRef::named("String")))
        .argument(InputValue::new("initialCount", TypeRef::named("Int")).default_value(0));

    vec![skip, include, deprecated, specified_by, defer, stream]
}
