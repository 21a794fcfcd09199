//! Mocked data for GraphQL schemas.
//!
//! A [`MockStore`] generates values from the schema types on first read and keeps them, so a
//! mocked schema built with [`add_mocks_to_schema`] answers consistently across queries. Values
//! can be seeded or overwritten with [`MockStore::set`].

mod add_mocks;
mod error;
mod mocks;
mod store;

pub use add_mocks::{add_mocks_to_schema, AddMocksOptions};
pub use error::MockError;
pub use mocks::{MockFn, Mocks};
pub use store::{Entity, GetArgs, MockStore, Ref, SetArgs, StoreValue, TypePolicy, ROOT_KEY};
