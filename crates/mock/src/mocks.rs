use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use rand::Rng;
use schema::{ConstValue, Number};
use uuid::Uuid;

pub type MockFn = Arc<dyn Fn() -> ConstValue + Send + Sync>;

/// Mock functions by type name.
///
/// A scalar or enum mock returns the leaf value itself. An object mock returns an object whose
/// entries seed the fields of the generated entity; fields it leaves out are generated from their
/// type. An interface or union mock must name the concrete type in `__typename`.
#[derive(Clone)]
pub struct Mocks(IndexMap<String, MockFn>);

impl Mocks {
    /// The default scalar mocks.
    pub fn new() -> Self {
        Mocks::empty()
            .mock("Int", || ConstValue::from(rand::thread_rng().gen_range(-100..=100_i32)))
            .mock("Float", || {
                Number::from_f64(rand::thread_rng().gen_range(-100.0..=100.0))
                    .map_or(ConstValue::Null, ConstValue::Number)
            })
            .mock("String", || ConstValue::String("Hello World".to_string()))
            .mock("Boolean", || ConstValue::Boolean(rand::random::<bool>()))
            .mock("ID", || ConstValue::String(Uuid::new_v4().to_string()))
    }

    /// No mocks at all, not even for the built-in scalars.
    pub fn empty() -> Self {
        Mocks(IndexMap::new())
    }

    #[must_use]
    pub fn mock<F>(mut self, type_name: impl Into<String>, mock: F) -> Self
    where
        F: Fn() -> ConstValue + Send + Sync + 'static,
    {
        self.0.insert(type_name.into(), Arc::new(mock));
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&MockFn> {
        self.0.get(type_name)
    }

    /// Adds the mocks of `other`, replacing ours on conflicts.
    pub fn extend(&mut self, other: Mocks) {
        self.0.extend(other.0);
    }
}

impl Default for Mocks {
    fn default() -> Self {
        Mocks::new()
    }
}

impl fmt::Debug for Mocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}
