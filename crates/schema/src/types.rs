use std::{fmt, sync::Arc};

use async_graphql_parser::{types as ast, Positioned};
use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;
use wrapping::Wrapping;

use crate::{IsTypeOf, Resolver, ScalarFn, TypeResolver};

/// Free-form metadata attached to types and schemas.
pub type Extensions = IndexMap<String, ConstValue>;

/// A named type with its list and non-null wrappers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: Name,
    pub wrapping: Wrapping,
}

impl TypeRef {
    pub fn named(name: impl AsRef<str>) -> Self {
        TypeRef {
            name: Name::new(name),
            wrapping: Wrapping::nullable(),
        }
    }

    pub fn non_null(name: impl AsRef<str>) -> Self {
        TypeRef {
            name: Name::new(name),
            wrapping: Wrapping::required(),
        }
    }

    /// Parses a type reference such as `[String!]!`.
    pub fn parse(ty: &str) -> Option<Self> {
        ast::Type::new(ty).map(|ty| Self::from_ast(&ty))
    }

    pub fn from_ast(ty: &ast::Type) -> Self {
        let mut lists = Vec::new();
        let mut current = ty;

        loop {
            match &current.base {
                ast::BaseType::Named(name) => {
                    let mut wrapping = Wrapping::new(!current.nullable);
                    for required in lists.into_iter().rev() {
                        wrapping = if required {
                            wrapping.list_non_null()
                        } else {
                            wrapping.list()
                        };
                    }

                    return TypeRef {
                        name: name.clone(),
                        wrapping,
                    };
                }
                ast::BaseType::List(inner) => {
                    lists.push(!current.nullable);
                    current = inner;
                }
            }
        }
    }

    pub fn to_ast(&self) -> ast::Type {
        let mut ty = ast::Type {
            base: ast::BaseType::Named(self.name.clone()),
            nullable: !self.wrapping.inner_is_required(),
        };

        let lists: Vec<_> = self.wrapping.list_wrappings().collect();
        for list in lists.into_iter().rev() {
            ty = ast::Type {
                base: ast::BaseType::List(Box::new(ty)),
                nullable: !list.is_required(),
            };
        }

        ty
    }

    pub fn is_non_null(&self) -> bool {
        self.wrapping.is_required()
    }

    pub fn is_list(&self) -> bool {
        self.wrapping.is_list()
    }

    #[must_use]
    pub fn without_non_null(&self) -> Self {
        TypeRef {
            name: self.name.clone(),
            wrapping: self.wrapping.without_non_null(),
        }
    }

    /// Type of the items of the outermost list, ignoring its own nullability.
    pub fn item_type(&self) -> Option<Self> {
        self.wrapping.without_list().map(|wrapping| TypeRef {
            name: self.name.clone(),
            wrapping,
        })
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wrapping.type_display(&self.name))
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({self})")
    }
}

/// A directive applied to a type system element.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: Name,
    pub arguments: IndexMap<Name, ConstValue>,
}

impl Directive {
    pub fn new(name: impl AsRef<str>) -> Self {
        Directive {
            name: Name::new(name),
            arguments: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_argument(mut self, name: impl AsRef<str>, value: impl Into<ConstValue>) -> Self {
        self.arguments.insert(Name::new(name), value.into());
        self
    }

    pub fn argument(&self, name: &str) -> Option<&ConstValue> {
        self.arguments.get(name)
    }

    pub fn from_ast(directive: &Positioned<ast::ConstDirective>) -> Self {
        Directive {
            name: directive.node.name.node.clone(),
            arguments: directive
                .node
                .arguments
                .iter()
                .map(|(name, value)| (name.node.clone(), value.node.clone()))
                .collect(),
        }
    }

    pub fn to_ast(&self) -> Positioned<ast::ConstDirective> {
        positioned(ast::ConstDirective {
            name: positioned(self.name.clone()),
            arguments: self
                .arguments
                .iter()
                .map(|(name, value)| (positioned(name.clone()), positioned(value.clone())))
                .collect(),
        })
    }
}

pub(crate) fn positioned<T>(node: T) -> Positioned<T> {
    Positioned::new(node, Default::default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeCategory::Scalar => "scalar",
            TypeCategory::Object => "object",
            TypeCategory::Interface => "interface",
            TypeCategory::Union => "union",
            TypeCategory::Enum => "enum",
            TypeCategory::InputObject => "input object",
        })
    }
}

/// Every named type of a schema, one variant per GraphQL type category.
#[derive(Debug, Clone)]
pub enum NamedType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

macro_rules! each_type {
    ($value:expr, $ty:ident => $body:expr) => {
        match $value {
            NamedType::Scalar($ty) => $body,
            NamedType::Object($ty) => $body,
            NamedType::Interface($ty) => $body,
            NamedType::Union($ty) => $body,
            NamedType::Enum($ty) => $body,
            NamedType::InputObject($ty) => $body,
        }
    };
}

impl NamedType {
    pub fn name(&self) -> &Name {
        each_type!(self, ty => &ty.name)
    }

    pub fn set_name(&mut self, name: Name) {
        each_type!(self, ty => ty.name = name)
    }

    pub fn description(&self) -> Option<&str> {
        each_type!(self, ty => ty.description.as_deref())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        each_type!(self, ty => ty.description = description)
    }

    pub fn directives(&self) -> &[Directive] {
        each_type!(self, ty => &ty.directives)
    }

    pub fn ast_node(&self) -> Option<&Positioned<ast::TypeDefinition>> {
        each_type!(self, ty => ty.ast_node.as_ref())
    }

    pub fn set_ast_node(&mut self, node: Option<Positioned<ast::TypeDefinition>>) {
        each_type!(self, ty => ty.ast_node = node)
    }

    pub fn extension_ast_nodes(&self) -> &[Positioned<ast::TypeDefinition>] {
        each_type!(self, ty => &ty.extension_ast_nodes)
    }

    pub fn extension_ast_nodes_mut(&mut self) -> &mut Vec<Positioned<ast::TypeDefinition>> {
        each_type!(self, ty => &mut ty.extension_ast_nodes)
    }

    pub fn extensions(&self) -> &Extensions {
        each_type!(self, ty => &ty.extensions)
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        each_type!(self, ty => &mut ty.extensions)
    }

    pub fn category(&self) -> TypeCategory {
        match self {
            NamedType::Scalar(_) => TypeCategory::Scalar,
            NamedType::Object(_) => TypeCategory::Object,
            NamedType::Interface(_) => TypeCategory::Interface,
            NamedType::Union(_) => TypeCategory::Union,
            NamedType::Enum(_) => TypeCategory::Enum,
            NamedType::InputObject(_) => TypeCategory::InputObject,
        }
    }

    pub fn is_input_type(&self) -> bool {
        matches!(
            self,
            NamedType::Scalar(_) | NamedType::Enum(_) | NamedType::InputObject(_)
        )
    }

    pub fn is_output_type(&self) -> bool {
        !matches!(self, NamedType::InputObject(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, NamedType::Interface(_) | NamedType::Union(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, NamedType::Scalar(_) | NamedType::Enum(_))
    }

    /// Output fields of objects and interfaces.
    pub fn fields(&self) -> Option<&IndexMap<Name, Field>> {
        match self {
            NamedType::Object(object) => Some(&object.fields),
            NamedType::Interface(interface) => Some(&interface.fields),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            NamedType::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceType> {
        match self {
            NamedType::Interface(interface) => Some(interface),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionType> {
        match self {
            NamedType::Union(union) => Some(union),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            NamedType::Enum(enum_type) => Some(enum_type),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarType> {
        match self {
            NamedType::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_input_object(&self) -> Option<&InputObjectType> {
        match self {
            NamedType::InputObject(input) => Some(input),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ScalarType {
    pub name: Name,
    pub description: Option<String>,
    pub specified_by_url: Option<String>,
    pub serialize: ScalarFn,
    pub parse_value: ScalarFn,
    pub parse_literal: ScalarFn,
    pub directives: Vec<Directive>,
    pub ast_node: Option<Positioned<ast::TypeDefinition>>,
    pub extension_ast_nodes: Vec<Positioned<ast::TypeDefinition>>,
    pub extensions: Extensions,
}

impl ScalarType {
    /// A custom scalar passing values through unchanged.
    pub fn new(name: impl AsRef<str>) -> Self {
        ScalarType {
            name: Name::new(name),
            description: None,
            specified_by_url: None,
            serialize: Arc::new(|value| Ok(value.clone())),
            parse_value: Arc::new(|value| Ok(value.clone())),
            parse_literal: Arc::new(|value| Ok(value.clone())),
            directives: Vec::new(),
            ast_node: None,
            extension_ast_nodes: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_serialize<F>(mut self, serialize: F) -> Self
    where
        F: Fn(&ConstValue) -> Result<ConstValue, String> + Send + Sync + 'static,
    {
        self.serialize = Arc::new(serialize);
        self
    }

    #[must_use]
    pub fn with_parse_value<F>(mut self, parse_value: F) -> Self
    where
        F: Fn(&ConstValue) -> Result<ConstValue, String> + Send + Sync + 'static,
    {
        self.parse_value = Arc::new(parse_value);
        self
    }

    #[must_use]
    pub fn with_parse_literal<F>(mut self, parse_literal: F) -> Self
    where
        F: Fn(&ConstValue) -> Result<ConstValue, String> + Send + Sync + 'static,
    {
        self.parse_literal = Arc::new(parse_literal);
        self
    }
}

impl fmt::Debug for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarType")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("specified_by_url", &self.specified_by_url)
            .field("directives", &self.directives)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: Name,
    pub description: Option<String>,
    pub fields: IndexMap<Name, Field>,
    pub interfaces: Vec<Name>,
    pub is_type_of: Option<IsTypeOf>,
    pub directives: Vec<Directive>,
    pub ast_node: Option<Positioned<ast::TypeDefinition>>,
    pub extension_ast_nodes: Vec<Positioned<ast::TypeDefinition>>,
    pub extensions: Extensions,
}

impl ObjectType {
    pub fn new(name: impl AsRef<str>) -> Self {
        ObjectType {
            name: Name::new(name),
            description: None,
            fields: IndexMap::new(),
            interfaces: Vec::new(),
            is_type_of: None,
            directives: Vec::new(),
            ast_node: None,
            extension_ast_nodes: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl AsRef<str>) -> Self {
        self.interfaces.push(Name::new(interface));
        self
    }
}

#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub name: Name,
    pub description: Option<String>,
    pub fields: IndexMap<Name, Field>,
    pub interfaces: Vec<Name>,
    pub resolve_type: Option<TypeResolver>,
    pub directives: Vec<Directive>,
    pub ast_node: Option<Positioned<ast::TypeDefinition>>,
    pub extension_ast_nodes: Vec<Positioned<ast::TypeDefinition>>,
    pub extensions: Extensions,
}

impl InterfaceType {
    pub fn new(name: impl AsRef<str>) -> Self {
        InterfaceType {
            name: Name::new(name),
            description: None,
            fields: IndexMap::new(),
            interfaces: Vec::new(),
            resolve_type: None,
            directives: Vec::new(),
            ast_node: None,
            extension_ast_nodes: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: Name,
    pub description: Option<String>,
    pub members: Vec<Name>,
    pub resolve_type: Option<TypeResolver>,
    pub directives: Vec<Directive>,
    pub ast_node: Option<Positioned<ast::TypeDefinition>>,
    pub extension_ast_nodes: Vec<Positioned<ast::TypeDefinition>>,
    pub extensions: Extensions,
}

impl UnionType {
    pub fn new(name: impl AsRef<str>) -> Self {
        UnionType {
            name: Name::new(name),
            description: None,
            members: Vec::new(),
            resolve_type: None,
            directives: Vec::new(),
            ast_node: None,
            extension_ast_nodes: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn member(mut self, member: impl AsRef<str>) -> Self {
        self.members.push(Name::new(member));
        self
    }
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: Name,
    pub description: Option<String>,
    pub values: IndexMap<Name, EnumValue>,
    pub directives: Vec<Directive>,
    pub ast_node: Option<Positioned<ast::TypeDefinition>>,
    pub extension_ast_nodes: Vec<Positioned<ast::TypeDefinition>>,
    pub extensions: Extensions,
}

impl EnumType {
    pub fn new(name: impl AsRef<str>) -> Self {
        EnumType {
            name: Name::new(name),
            description: None,
            values: IndexMap::new(),
            directives: Vec::new(),
            ast_node: None,
            extension_ast_nodes: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn value(mut self, value: EnumValue) -> Self {
        self.values.insert(value.name.clone(), value);
        self
    }

    /// Maps an internal value back to its public name.
    pub fn serialize(&self, value: &ConstValue) -> Option<&Name> {
        if let ConstValue::Enum(name) = value {
            if let Some(value) = self.values.get(name) {
                return Some(&value.name);
            }
        }

        self.values
            .values()
            .find(|candidate| &candidate.value == value)
            .map(|value| &value.name)
    }

    /// Maps a public name to its internal value.
    pub fn parse(&self, name: &str) -> Option<&ConstValue> {
        self.values.get(name).map(|value| &value.value)
    }
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: Name,
    pub description: Option<String>,
    /// Internal representation handed to resolvers. Defaults to the name as a string.
    pub value: ConstValue,
    pub deprecation_reason: Option<String>,
    pub directives: Vec<Directive>,
    pub ast_node: Option<Positioned<ast::EnumValueDefinition>>,
}

impl EnumValue {
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = Name::new(name);

        EnumValue {
            value: ConstValue::String(name.to_string()),
            name,
            description: None,
            deprecation_reason: None,
            directives: Vec::new(),
            ast_node: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: Name,
    pub description: Option<String>,
    pub fields: IndexMap<Name, InputValue>,
    pub directives: Vec<Directive>,
    pub ast_node: Option<Positioned<ast::TypeDefinition>>,
    pub extension_ast_nodes: Vec<Positioned<ast::TypeDefinition>>,
    pub extensions: Extensions,
}

impl InputObjectType {
    pub fn new(name: impl AsRef<str>) -> Self {
        InputObjectType {
            name: Name::new(name),
            description: None,
            fields: IndexMap::new(),
            directives: Vec::new(),
            ast_node: None,
            extension_ast_nodes: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: InputValue) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

/// Output field of an object or interface.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: Name,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<Name, InputValue>,
    /// Falls back to the executor's default field resolver when absent.
    pub resolve: Option<Resolver>,
    pub subscribe: Option<Resolver>,
    pub deprecation_reason: Option<String>,
    pub directives: Vec<Directive>,
    pub ast_node: Option<Positioned<ast::FieldDefinition>>,
    pub extensions: Extensions,
}

impl Field {
    pub fn new(name: impl AsRef<str>, ty: TypeRef) -> Self {
        Field {
            name: Name::new(name),
            description: None,
            ty,
            arguments: IndexMap::new(),
            resolve: None,
            subscribe: None,
            deprecation_reason: None,
            directives: Vec::new(),
            ast_node: None,
            extensions: Extensions::new(),
        }
    }

    #[must_use]
    pub fn argument(mut self, argument: InputValue) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.resolve = Some(resolver);
        self
    }

    #[must_use]
    pub fn subscriber(mut self, subscribe: Resolver) -> Self {
        self.subscribe = Some(subscribe);
        self
    }
}

/// Argument, input field or variable-like input definition.
#[derive(Debug, Clone)]
pub struct InputValue {
    pub name: Name,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<ConstValue>,
    pub deprecation_reason: Option<String>,
    pub directives: Vec<Directive>,
    pub ast_node: Option<Positioned<ast::InputValueDefinition>>,
}

impl InputValue {
    pub fn new(name: impl AsRef<str>, ty: TypeRef) -> Self {
        InputValue {
            name: Name::new(name),
            description: None,
            ty,
            default_value: None,
            deprecation_reason: None,
            directives: Vec::new(),
            ast_node: None,
        }
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<ConstValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct DirectiveDefinition {
    pub name: Name,
    pub description: Option<String>,
    pub arguments: IndexMap<Name, InputValue>,
    pub is_repeatable: bool,
    pub locations: Vec<ast::DirectiveLocation>,
    pub ast_node: Option<Positioned<ast::DirectiveDefinition>>,
}

impl DirectiveDefinition {
    pub fn new(name: impl AsRef<str>, locations: impl IntoIterator<Item = ast::DirectiveLocation>) -> Self {
        DirectiveDefinition {
            name: Name::new(name),
            description: None,
            arguments: IndexMap::new(),
            is_repeatable: false,
            locations: locations.into_iter().collect(),
            ast_node: None,
        }
    }

    #[must_use]
    pub fn argument(mut self, argument: InputValue) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }
}

/// `FIELD_DEFINITION` style name of a directive location.
pub fn directive_location_name(location: &ast::DirectiveLocation) -> String {
    let debug = format!("{location:?}");
    let mut name = String::with_capacity(debug.len() + 4);

    for (i, c) in debug.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            name.push('_');
        }
        name.push(c.to_ascii_uppercase());
    }

    name
}
