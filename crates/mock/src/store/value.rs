use std::fmt;

use indexmap::IndexMap;
use schema::{ArgumentValues, ConstValue, FieldValue, Name};

/// Key of the single entity backing each root operation type.
pub const ROOT_KEY: &str = "ROOT";

/// Pointer to an entity of the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ref {
    pub type_name: String,
    pub key: String,
}

impl Ref {
    pub fn new(type_name: impl Into<String>, key: impl Into<String>) -> Self {
        Ref {
            type_name: type_name.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.key)
    }
}

/// A value as stored: leaves as they are, entities as refs, lists item by item.
///
/// When setting, an object `Value` for a composite field is inserted as an entity and stored as
/// a `Ref`.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Value(ConstValue),
    Ref(Ref),
    List(Vec<StoreValue>),
}

impl StoreValue {
    pub const fn null() -> Self {
        StoreValue::Value(ConstValue::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StoreValue::Value(ConstValue::Null))
    }

    pub fn as_entity_ref(&self) -> Option<&Ref> {
        match self {
            StoreValue::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&ConstValue> {
        match self {
            StoreValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StoreValue]> {
        match self {
            StoreValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<ConstValue> for StoreValue {
    fn from(value: ConstValue) -> Self {
        StoreValue::Value(value)
    }
}

impl From<Ref> for StoreValue {
    fn from(reference: Ref) -> Self {
        StoreValue::Ref(reference)
    }
}

impl From<Vec<StoreValue>> for StoreValue {
    fn from(items: Vec<StoreValue>) -> Self {
        StoreValue::List(items)
    }
}

/// Refs become opaque values carrying their type, so abstract fields resolve without help and
/// nested mocked resolvers find the entity back.
impl From<StoreValue> for FieldValue {
    fn from(value: StoreValue) -> Self {
        match value {
            StoreValue::Value(value) => FieldValue::Value(value),
            StoreValue::Ref(reference) => {
                let type_name = reference.type_name.clone();
                FieldValue::opaque(reference).with_type(type_name)
            }
            StoreValue::List(items) => FieldValue::list(items.into_iter().map(FieldValue::from)),
        }
    }
}

impl fmt::Display for StoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreValue::Value(value) => write!(f, "{value}"),
            StoreValue::Ref(reference) => write!(f, "{reference}"),
            StoreValue::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Stored fields of one entity, keyed by field name and serialized arguments.
pub type Entity = IndexMap<String, StoreValue>;

/// Read request. Without a field name it returns a [`Ref`] to the entity, creating it when no
/// key is given.
#[derive(Debug, Clone)]
pub struct GetArgs {
    pub type_name: String,
    pub key: Option<String>,
    pub field_name: Option<String>,
    pub field_args: ArgumentValues,
    /// Stored and returned when nothing is stored yet. For an entity, the fields to seed it with.
    pub default_value: Option<StoreValue>,
}

impl GetArgs {
    /// A new entity of `type_name`, or the `ROOT` entity of a root type.
    pub fn entity(type_name: impl Into<String>) -> Self {
        GetArgs {
            type_name: type_name.into(),
            key: None,
            field_name: None,
            field_args: ArgumentValues::new(),
            default_value: None,
        }
    }

    pub fn entity_with_key(type_name: impl Into<String>, key: impl Into<String>) -> Self {
        GetArgs {
            key: Some(key.into()),
            ..GetArgs::entity(type_name)
        }
    }

    pub fn field(type_name: impl Into<String>, key: impl Into<String>, field_name: impl Into<String>) -> Self {
        GetArgs {
            field_name: Some(field_name.into()),
            ..GetArgs::entity_with_key(type_name, key)
        }
    }

    pub fn ref_field(reference: &Ref, field_name: impl Into<String>) -> Self {
        GetArgs::field(reference.type_name.clone(), reference.key.clone(), field_name)
    }

    #[must_use]
    pub fn with_args(mut self, args: ArgumentValues) -> Self {
        self.field_args = args;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<StoreValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Write request. Without a field name the value must be an object of fields to set.
#[derive(Debug, Clone)]
pub struct SetArgs {
    pub type_name: String,
    pub key: String,
    pub field_name: Option<String>,
    pub field_args: ArgumentValues,
    pub value: StoreValue,
}

impl SetArgs {
    pub fn entity(type_name: impl Into<String>, key: impl Into<String>, values: impl Into<StoreValue>) -> Self {
        SetArgs {
            type_name: type_name.into(),
            key: key.into(),
            field_name: None,
            field_args: ArgumentValues::new(),
            value: values.into(),
        }
    }

    pub fn field(
        type_name: impl Into<String>,
        key: impl Into<String>,
        field_name: impl Into<String>,
        value: impl Into<StoreValue>,
    ) -> Self {
        SetArgs {
            field_name: Some(field_name.into()),
            ..SetArgs::entity(type_name, key, value)
        }
    }

    pub fn ref_field(reference: &Ref, field_name: impl Into<String>, value: impl Into<StoreValue>) -> Self {
        SetArgs::field(reference.type_name.clone(), reference.key.clone(), field_name, value)
    }

    #[must_use]
    pub fn with_args(mut self, args: ArgumentValues) -> Self {
        self.field_args = args;
        self
    }
}

/// Name a field value is stored under: the field name, followed by its arguments sorted by name
/// when there are any.
pub(super) fn field_name_in_store(field_name: &str, args: &ArgumentValues) -> String {
    if args.is_empty() {
        return field_name.to_string();
    }

    let mut sorted: IndexMap<Name, ConstValue> = args.clone();
    sorted.sort_by(|a, _, b, _| a.as_str().cmp(b.as_str()));

    format!("{field_name}:{}", ConstValue::Object(sorted))
}

/// Entity key read from a key field value.
pub(super) fn key_of(value: &ConstValue) -> String {
    match value {
        ConstValue::String(key) => key.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_are_part_of_the_stored_name() {
        assert_eq!(field_name_in_store("friends", &ArgumentValues::new()), "friends");

        let last = (Name::new("last"), ConstValue::from(2));
        let after = (Name::new("after"), ConstValue::String("a".into()));

        let stored = field_name_in_store("friends", &ArgumentValues::from([last.clone(), after.clone()]));
        assert!(stored.starts_with("friends:{after: "));
        assert_eq!(stored, field_name_in_store("friends", &ArgumentValues::from([after, last])));
    }

    #[test]
    fn refs_carry_their_type_into_field_values() {
        let value = FieldValue::from(StoreValue::Ref(Ref::new("User", "1")));

        assert_eq!(value.type_name().map(|name| name.as_str()), Some("User"));
        assert_eq!(value.downcast_ref::<Ref>(), Some(&Ref::new("User", "1")));
    }
}
