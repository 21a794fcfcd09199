//! In-memory store of mocked entities: type name, then entity key, then field.

mod value;

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use rand::seq::SliceRandom;
use schema::{ConstValue, NamedType, Schema, TypeRef};
use uuid::Uuid;

pub use value::{Entity, GetArgs, Ref, SetArgs, StoreValue, ROOT_KEY};

use crate::{MockError, Mocks};
use value::{field_name_in_store, key_of};

/// Generated lists always have this many items.
const LIST_LENGTH: usize = 2;

type Entities = IndexMap<String, IndexMap<String, Entity>>;

/// Overrides how entities of a type are keyed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypePolicy {
    /// `None` makes the type keyless: its entities get random keys.
    pub key_field_name: Option<String>,
}

impl TypePolicy {
    pub fn key_field(name: impl Into<String>) -> Self {
        TypePolicy {
            key_field_name: Some(name.into()),
        }
    }

    pub fn keyless() -> Self {
        TypePolicy { key_field_name: None }
    }
}

/// Store of mocked data for one schema. Missing values are generated on first read and kept, so
/// reading the same field twice gives the same value.
#[derive(Debug)]
pub struct MockStore {
    schema: Schema,
    mocks: Mocks,
    type_policies: IndexMap<String, TypePolicy>,
    entities: Mutex<Entities>,
}

impl MockStore {
    /// A store generating values with the default scalar mocks.
    pub fn new(schema: Schema) -> Self {
        MockStore {
            schema,
            mocks: Mocks::new(),
            type_policies: IndexMap::new(),
            entities: Mutex::new(Entities::new()),
        }
    }

    /// Adds type mocks on top of the defaults.
    #[must_use]
    pub fn with_mocks(mut self, mocks: Mocks) -> Self {
        self.mocks.extend(mocks);
        self
    }

    #[must_use]
    pub fn with_type_policy(mut self, type_name: impl Into<String>, policy: TypePolicy) -> Self {
        self.type_policies.insert(type_name.into(), policy);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get(&self, args: GetArgs) -> Result<StoreValue, MockError> {
        self.session().get(args)
    }

    pub fn set(&self, args: SetArgs) -> Result<(), MockError> {
        self.session().set(args)
    }

    pub fn has(&self, type_name: &str, key: &str) -> bool {
        self.lock()
            .get(type_name)
            .is_some_and(|entities| entities.contains_key(key))
    }

    /// Forgets every stored entity.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Refs to the stored entities of `type_name` matching `predicate`.
    pub fn filter(&self, type_name: &str, predicate: impl Fn(&Entity) -> bool) -> Vec<Ref> {
        self.lock()
            .get(type_name)
            .into_iter()
            .flatten()
            .filter(|(_, entity)| predicate(entity))
            .map(|(key, _)| Ref::new(type_name, key.clone()))
            .collect()
    }

    pub fn find(&self, type_name: &str, predicate: impl Fn(&Entity) -> bool) -> Option<Ref> {
        self.lock().get(type_name).and_then(|entities| {
            entities
                .iter()
                .find(|(_, entity)| predicate(entity))
                .map(|(key, _)| Ref::new(type_name, key.clone()))
        })
    }

    /// Copy of the stored fields of an entity.
    pub fn entity(&self, reference: &Ref) -> Option<Entity> {
        self.lock()
            .get(&reference.type_name)
            .and_then(|entities| entities.get(&reference.key))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Entities> {
        self.entities.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self) -> Session<'_> {
        Session {
            store: self,
            entities: self.lock(),
        }
    }

    fn key_field_name(&self, type_name: &str) -> Option<&str> {
        if let Some(policy) = self.type_policies.get(type_name) {
            return policy.key_field_name.as_deref();
        }

        let fields = self.schema.get_type(type_name)?.fields()?;
        ["id", "_id"].into_iter().find(|name| fields.contains_key(*name))
    }

    fn is_key_field(&self, type_name: &str, field_name: &str) -> bool {
        self.key_field_name(type_name) == Some(field_name)
    }

    fn field_type(&self, type_name: &str, field_name: &str) -> Result<&TypeRef, MockError> {
        let ty = self
            .schema
            .get_type(type_name)
            .ok_or_else(|| MockError::UnknownType(type_name.to_string()))?;

        ty.fields()
            .and_then(|fields| fields.get(field_name))
            .map(|field| &field.ty)
            .ok_or_else(|| MockError::UnknownField {
                type_name: type_name.to_string(),
                field_name: field_name.to_string(),
            })
    }
}

/// One locked access to the entities. Generating a value can insert entities and set other
/// fields, all under the same lock.
struct Session<'a> {
    store: &'a MockStore,
    entities: MutexGuard<'a, Entities>,
}

impl Session<'_> {
    fn get(&mut self, args: GetArgs) -> Result<StoreValue, MockError> {
        let GetArgs {
            type_name,
            key,
            field_name,
            field_args,
            default_value,
        } = args;

        let Some(field_name) = field_name else {
            return self.get_entity(type_name, key, default_value).map(StoreValue::Ref);
        };

        let key = match key {
            Some(key) => key,
            None => self.get_entity(type_name.clone(), None, None)?.key,
        };

        let stored_name = field_name_in_store(&field_name, &field_args);
        if let Some(value) = self.stored(&type_name, &key, &stored_name) {
            return Ok(value.clone());
        }

        let value = match default_value {
            Some(value) => value,
            None if self.store.is_key_field(&type_name, &field_name) => StoreValue::Value(ConstValue::String(key.clone())),
            None => {
                let (value, others) = self.generate_field_value(&type_name, &field_name)?;
                for (other_name, other_value) in others {
                    if !self.store.is_key_field(&type_name, &other_name) {
                        self.set_field(&type_name, &key, &other_name, &other_name, other_value, true)?;
                    }
                }
                value
            }
        };

        self.set_field(&type_name, &key, &field_name, &stored_name, value, true)?;

        Ok(self
            .stored(&type_name, &key, &stored_name)
            .cloned()
            .unwrap_or_else(StoreValue::null))
    }

    fn get_entity(
        &mut self,
        type_name: String,
        key: Option<String>,
        default_value: Option<StoreValue>,
    ) -> Result<Ref, MockError> {
        let values = match default_value {
            None => Entity::new(),
            Some(value) => entity_values(&type_name, value)?,
        };

        let key = match key {
            Some(key) => key,
            None if self.store.schema.is_root_type(&type_name) => ROOT_KEY.to_string(),
            None => return self.insert(&type_name, values, true),
        };

        for (field_name, value) in values {
            if field_name != "__typename" {
                self.set_field(&type_name, &key, &field_name, &field_name, value, true)?;
            }
        }

        self.entities
            .entry(type_name.clone())
            .or_default()
            .entry(key.clone())
            .or_default();

        Ok(Ref { type_name, key })
    }

    fn set(&mut self, args: SetArgs) -> Result<(), MockError> {
        let SetArgs {
            type_name,
            key,
            field_name,
            field_args,
            value,
        } = args;

        match field_name {
            Some(field_name) => {
                let stored_name = field_name_in_store(&field_name, &field_args);
                self.set_field(&type_name, &key, &field_name, &stored_name, value, false)
            }
            None => {
                for (field_name, value) in entity_values(&type_name, value)? {
                    if field_name != "__typename" {
                        self.set_field(&type_name, &key, &field_name, &field_name, value, false)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn stored(&self, type_name: &str, key: &str, stored_name: &str) -> Option<&StoreValue> {
        self.entities.get(type_name)?.get(key)?.get(stored_name)
    }

    fn set_field(
        &mut self,
        type_name: &str,
        key: &str,
        field_name: &str,
        stored_name: &str,
        value: StoreValue,
        no_override: bool,
    ) -> Result<(), MockError> {
        if self.store.is_key_field(type_name, field_name) {
            let matches_key = match &value {
                StoreValue::Value(value) => key_of(value) == key,
                _ => false,
            };

            if !matches_key {
                return Err(MockError::KeyFieldMismatch {
                    type_name: type_name.to_string(),
                    field_name: field_name.to_string(),
                    value: value.to_string(),
                    key: key.to_string(),
                });
            }
        }

        let field_type = self.store.field_type(type_name, field_name)?.clone();

        let entity = self
            .entities
            .entry(type_name.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default();

        if no_override && entity.contains_key(stored_name) {
            return Ok(());
        }
        let current = entity.get(stored_name).cloned();

        let normalized = self
            .normalize(&field_type, value, current, no_override)
            .map_err(|error| MockError::NotNormalizable {
                type_name: type_name.to_string(),
                field_name: field_name.to_string(),
                message: error.to_string(),
            })?;

        tracing::trace!(type_name, key, field_name = stored_name, "storing mocked value");

        self.entities
            .entry(type_name.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .insert(stored_name.to_string(), normalized);

        Ok(())
    }

    /// Inserts an entity, generating its key when `values` doesn't hold the key field.
    fn insert(&mut self, type_name: &str, values: Entity, no_override: bool) -> Result<Ref, MockError> {
        let mut to_insert = Entity::new();

        let key = match self.store.key_field_name(type_name).map(str::to_string) {
            None => Uuid::new_v4().to_string(),
            Some(key_field) => match values.get(&key_field) {
                Some(StoreValue::Value(value)) => key_of(value),
                Some(other) => {
                    return Err(MockError::InvalidValue(format!(
                        "key field {type_name}.{key_field} must be a scalar but got {other}"
                    )))
                }
                None => {
                    let (value, others) = self.generate_field_value(type_name, &key_field)?;
                    let StoreValue::Value(key_value) = &value else {
                        return Err(MockError::InvalidValue(format!(
                            "generated key field {type_name}.{key_field} is not a scalar"
                        )));
                    };
                    let key = key_of(key_value);
                    to_insert.extend(others.into_iter().filter(|(name, _)| name != &key_field));
                    to_insert.insert(key_field, value);
                    key
                }
            },
        };

        to_insert.extend(values);

        for (field_name, value) in to_insert {
            if field_name != "__typename" {
                self.set_field(type_name, &key, &field_name, &field_name, value, no_override)?;
            }
        }

        self.entities
            .entry(type_name.to_string())
            .or_default()
            .entry(key.clone())
            .or_default();

        Ok(Ref::new(type_name, key))
    }

    /// Value of a field from the type mock when it has one, from the field type otherwise. Other
    /// fields returned by the type mock come along so the caller can store them too.
    fn generate_field_value(&mut self, type_name: &str, field_name: &str) -> Result<(StoreValue, Entity), MockError> {
        let mut others = Entity::new();

        if let Some(mock) = self.store.mocks.get(type_name) {
            let ConstValue::Object(values) = mock() else {
                return Err(MockError::NotAnObject(type_name.to_string()));
            };

            let mut mocked = None;
            for (name, value) in values {
                if name.as_str() == field_name {
                    mocked = Some(value);
                } else {
                    others.insert(name.to_string(), StoreValue::Value(value));
                }
            }

            if let Some(value) = mocked {
                return Ok((StoreValue::Value(value), others));
            }
        }

        let field_type = self.store.field_type(type_name, field_name)?.clone();
        let value = self.generate_value(&field_type)?;

        Ok((value, others))
    }

    fn generate_value(&mut self, ty: &TypeRef) -> Result<StoreValue, MockError> {
        if let Some(item_type) = ty.item_type() {
            return (0..LIST_LENGTH)
                .map(|_| self.generate_value(&item_type))
                .collect::<Result<Vec<_>, _>>()
                .map(StoreValue::List);
        }

        let store = self.store;
        let named_type = store
            .schema
            .get_type(&ty.name)
            .ok_or_else(|| MockError::UnknownType(ty.name.to_string()))?;

        match named_type {
            NamedType::Scalar(scalar) => store
                .mocks
                .get(&scalar.name)
                .map(|mock| StoreValue::Value(mock()))
                .ok_or_else(|| MockError::NoMock(scalar.name.to_string())),
            NamedType::Enum(enum_type) => {
                if let Some(mock) = store.mocks.get(&enum_type.name) {
                    return Ok(StoreValue::Value(mock()));
                }

                let values = enum_type.values.values().collect::<Vec<_>>();
                Ok(values
                    .choose(&mut rand::thread_rng())
                    .map_or_else(StoreValue::null, |value| StoreValue::Value(value.value.clone())))
            }
            NamedType::Object(object) => self.insert(&object.name, Entity::new(), false).map(StoreValue::Ref),
            NamedType::Interface(_) | NamedType::Union(_) => self.generate_abstract_value(named_type.name().as_str()),
            NamedType::InputObject(input) => Err(MockError::InvalidValue(format!(
                "cannot generate a value of input type {}",
                input.name
            ))),
        }
    }

    /// Picks a random possible type unless the type has a mock, which must then name the type in
    /// `__typename`.
    fn generate_abstract_value(&mut self, type_name: &str) -> Result<StoreValue, MockError> {
        let store = self.store;

        let (object_type, values) = match store.mocks.get(type_name) {
            Some(mock) => match mock() {
                ConstValue::Null => return Ok(StoreValue::null()),
                ConstValue::Object(mut values) => match values.shift_remove("__typename") {
                    Some(ConstValue::String(object_type)) => (object_type, values),
                    _ => return Err(MockError::MissingTypename(type_name.to_string())),
                },
                _ => return Err(MockError::NotAnObject(type_name.to_string())),
            },
            None => {
                let object_type = store
                    .schema
                    .possible_types(type_name)
                    .choose(&mut rand::thread_rng())
                    .ok_or_else(|| MockError::MissingTypename(type_name.to_string()))?;
                (object_type.to_string(), IndexMap::new())
            }
        };

        let values = values
            .into_iter()
            .map(|(name, value)| (name.to_string(), StoreValue::Value(value)))
            .collect();

        self.insert(&object_type, values, false).map(StoreValue::Ref)
    }

    /// Brings `value` into its stored shape for `ty`: objects become refs to inserted entities,
    /// lists are normalized item by item.
    fn normalize(
        &mut self,
        ty: &TypeRef,
        value: StoreValue,
        current: Option<StoreValue>,
        no_override: bool,
    ) -> Result<StoreValue, MockError> {
        if value.is_null() {
            if ty.is_non_null() {
                return Err(MockError::InvalidValue(format!(
                    "should not be null because {ty} is not nullable"
                )));
            }
            return Ok(value);
        }

        if let Some(item_type) = ty.item_type() {
            let items = match value {
                StoreValue::List(items) => items,
                StoreValue::Value(ConstValue::List(items)) => items.into_iter().map(StoreValue::Value).collect(),
                other => {
                    return Err(MockError::InvalidValue(format!(
                        "should be an array or null but got {other}"
                    )))
                }
            };

            let current = match current {
                Some(StoreValue::List(current)) => current,
                _ => Vec::new(),
            };

            return items
                .into_iter()
                .enumerate()
                .map(|(index, item)| self.normalize(&item_type, item, current.get(index).cloned(), no_override))
                .collect::<Result<Vec<_>, _>>()
                .map(StoreValue::List);
        }

        let store = self.store;
        let named_type = store
            .schema
            .get_type(&ty.name)
            .ok_or_else(|| MockError::UnknownType(ty.name.to_string()))?;

        if named_type.is_leaf() {
            return match value {
                StoreValue::Value(_) => Ok(value),
                other => Err(MockError::InvalidValue(format!("should be a leaf value but got {other}"))),
            };
        }

        let values = match value {
            StoreValue::Ref(reference) => return Ok(StoreValue::Ref(reference)),
            StoreValue::Value(ConstValue::Object(values)) => values,
            other => {
                return Err(MockError::InvalidValue(format!(
                    "should be an object or null but got {other}"
                )))
            }
        };

        let object_type = if named_type.is_abstract() {
            match values.get("__typename") {
                Some(ConstValue::String(object_type)) => object_type.clone(),
                _ => {
                    return Err(MockError::InvalidValue(format!(
                        "should contain a '__typename' because {} is an abstract type",
                        ty.name
                    )))
                }
            }
        } else {
            ty.name.to_string()
        };

        let values: Entity = values
            .into_iter()
            .map(|(name, value)| (name.to_string(), StoreValue::Value(value)))
            .collect();

        // Updating a field already pointing at an entity of the same type updates that entity.
        if let Some(StoreValue::Ref(current)) = current {
            if current.type_name == object_type {
                for (field_name, value) in values {
                    if field_name != "__typename" {
                        self.set_field(&current.type_name, &current.key, &field_name, &field_name, value, no_override)?;
                    }
                }
                return Ok(StoreValue::Ref(current));
            }
        }

        self.insert(&object_type, values, no_override).map(StoreValue::Ref)
    }
}

fn entity_values(type_name: &str, value: StoreValue) -> Result<Entity, MockError> {
    match value {
        StoreValue::Value(ConstValue::Object(values)) => Ok(values
            .into_iter()
            .map(|(name, value)| (name.to_string(), StoreValue::Value(value)))
            .collect()),
        other => Err(MockError::InvalidValue(format!(
            "values of an entity of {type_name} must be an object but got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use schema::build_schema;
    use serde_json::json;

    use super::*;

    const SDL: &str = r#"
        type Query { viewer: User node: Node }
        interface Node { id: ID! }
        type User implements Node { id: ID! name: String friends: [User!]! age(unit: String): Int }
        type Group implements Node { id: ID! }
    "#;

    fn store() -> MockStore {
        MockStore::new(build_schema(SDL).unwrap())
    }

    fn value(json: serde_json::Value) -> StoreValue {
        StoreValue::Value(ConstValue::from_json(json).unwrap())
    }

    fn viewer(store: &MockStore) -> Ref {
        store
            .get(GetArgs::field("Query", ROOT_KEY, "viewer"))
            .unwrap()
            .as_entity_ref()
            .cloned()
            .unwrap()
    }

    #[test]
    fn generated_values_are_kept() {
        let store = store();
        let user = viewer(&store);

        assert_eq!(user.type_name, "User");
        assert_eq!(viewer(&store), user);
        assert!(store.has("User", &user.key));

        let name = store.get(GetArgs::ref_field(&user, "name")).unwrap();
        assert_eq!(name, value(json!("Hello World")));

        let id = store.get(GetArgs::ref_field(&user, "id")).unwrap();
        assert_eq!(id, value(json!(user.key)));

        let friends = store.get(GetArgs::ref_field(&user, "friends")).unwrap();
        assert_eq!(friends.as_list().unwrap().len(), 2);
        assert_eq!(store.get(GetArgs::ref_field(&user, "friends")).unwrap(), friends);
    }

    #[test]
    fn arguments_select_separate_values() {
        let store = store();

        let meters = GetArgs::field("User", "1", "age")
            .with_args([(schema::Name::new("unit"), ConstValue::String("m".into()))].into())
            .with_default(value(json!(3)));
        assert_eq!(store.get(meters).unwrap(), value(json!(3)));

        store.set(SetArgs::field("User", "1", "age", value(json!(7)))).unwrap();

        let entity = store.entity(&Ref::new("User", "1")).unwrap();
        assert_eq!(entity.len(), 2);
        assert_eq!(entity["age"], value(json!(7)));
    }

    #[test]
    fn nested_objects_become_entities() {
        let store = store();

        store
            .set(SetArgs::field(
                "Query",
                ROOT_KEY,
                "viewer",
                value(json!({ "id": "1", "name": "Ada", "friends": [{ "id": "2", "name": "Grace" }] })),
            ))
            .unwrap();

        assert_eq!(viewer(&store), Ref::new("User", "1"));
        assert_eq!(
            store.get(GetArgs::field("User", "2", "name")).unwrap(),
            value(json!("Grace"))
        );

        // Setting an object over an entity updates that entity.
        store
            .set(SetArgs::field("Query", ROOT_KEY, "viewer", value(json!({ "name": "Ada L." }))))
            .unwrap();
        assert_eq!(viewer(&store), Ref::new("User", "1"));
        assert_eq!(
            store.get(GetArgs::field("User", "1", "name")).unwrap(),
            value(json!("Ada L."))
        );

        assert_eq!(store.find("User", |user| user.get("name") == Some(&value(json!("Grace")))), Some(Ref::new("User", "2")));
        assert_eq!(store.filter("User", |_| true).len(), 2);

        store.reset();
        assert!(!store.has("User", "1"));
    }

    #[test]
    fn key_fields_must_match_the_key() {
        let store = store();

        let error = store
            .set(SetArgs::field("User", "1", "id", value(json!("2"))))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Field id is a key field of User and you are trying to set it to \"2\" while the key is 1"
        );

        store.set(SetArgs::field("User", "1", "id", value(json!("1")))).unwrap();
    }

    #[test]
    fn type_policies_choose_the_key_field() {
        let store = store()
            .with_type_policy("User", TypePolicy::key_field("name"))
            .with_type_policy("Group", TypePolicy::keyless());

        let user = store.get(GetArgs::entity("User")).unwrap();
        assert_eq!(user.as_entity_ref().unwrap().key, "Hello World");

        let group = store.get(GetArgs::entity("Group")).unwrap();
        assert!(Uuid::parse_str(&group.as_entity_ref().unwrap().key).is_ok());

        // Without a key field, `id` is a plain field.
        store
            .set(SetArgs::field("Group", "g", "id", value(json!("anything"))))
            .unwrap();
    }

    #[test]
    fn type_mocks_seed_entities() {
        let store = store().with_mocks(Mocks::empty().mock("User", || {
            ConstValue::from_json(json!({ "name": "Mocked", "age": 42 })).unwrap()
        }));

        let user = viewer(&store);
        assert_eq!(store.get(GetArgs::ref_field(&user, "name")).unwrap(), value(json!("Mocked")));
        assert_eq!(store.get(GetArgs::ref_field(&user, "age")).unwrap(), value(json!(42)));
    }

    #[test]
    fn abstract_types_need_a_typename() {
        let store = store();
        let node = store.get(GetArgs::field("Query", ROOT_KEY, "node")).unwrap();
        assert!(["User", "Group"].contains(&node.as_entity_ref().unwrap().type_name.as_str()));

        let store = MockStore::new(build_schema(SDL).unwrap()).with_mocks(
            Mocks::empty().mock("Node", || ConstValue::from_json(json!({ "id": "1" })).unwrap()),
        );
        let error = store.get(GetArgs::field("Query", ROOT_KEY, "node")).unwrap_err();
        assert_eq!(error.to_string(), "Please return a __typename in \"Node\"");

        let store = MockStore::new(build_schema(SDL).unwrap()).with_mocks(
            Mocks::empty().mock("Node", || ConstValue::from_json(json!({ "__typename": "Group", "id": "g1" })).unwrap()),
        );
        let node = store.get(GetArgs::field("Query", ROOT_KEY, "node")).unwrap();
        assert_eq!(node, StoreValue::Ref(Ref::new("Group", "g1")));
    }

    #[test]
    fn custom_scalars_need_a_mock() {
        let store = MockStore::new(build_schema("scalar Date type Query { today: Date }").unwrap());

        let error = store.get(GetArgs::field("Query", ROOT_KEY, "today")).unwrap_err();
        assert_eq!(error.to_string(), "No mock defined for type \"Date\"");

        let store = store.with_mocks(Mocks::empty().mock("Date", || ConstValue::String("2024-01-01".into())));
        assert_eq!(
            store.get(GetArgs::field("Query", ROOT_KEY, "today")).unwrap(),
            value(json!("2024-01-01"))
        );
    }

    #[test]
    fn null_is_rejected_for_non_null_fields() {
        let store = store();

        let error = store
            .set(SetArgs::field("User", "1", "friends", StoreValue::null()))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Value to set in User.friends is not normalizable: should not be null because [User!]! is not nullable"
        );
    }
}
