//! Loading of GraphQL type definitions from pointers: files, raw SDL or anything a custom
//! [`Loader`] understands.

mod error;
mod file;
mod load;
mod loader;
mod options;
mod sdl;

pub use error::LoaderError;
pub use file::GraphQLFileLoader;
pub use load::{default_loaders, load_schema, load_type_defs};
pub use loader::{Loader, Source};
pub use options::LoadOptions;
pub use sdl::SdlLoader;
