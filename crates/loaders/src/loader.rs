use merge::TypeSource;
use schema::{ast, Schema};

use crate::{LoadOptions, LoaderError};

/// Turns a pointer (a path, raw SDL, ...) into type definition sources.
#[async_trait::async_trait]
pub trait Loader: Send + Sync {
    fn loader_id(&self) -> &'static str;

    /// Whether the pointer is something this loader understands. Loading may still fail.
    async fn can_load(&self, pointer: &str, options: &LoadOptions) -> bool;

    async fn load(&self, pointer: &str, options: &LoadOptions) -> Result<Vec<Source>, LoaderError>;
}

/// Type definitions produced by a loader, in whatever forms it had them.
#[derive(Debug, Clone, Default)]
pub struct Source {
    pub document: Option<ast::ServiceDocument>,
    pub schema: Option<Schema>,
    pub raw_sdl: Option<String>,
    pub location: Option<String>,
}

impl Source {
    pub fn has_definitions(&self) -> bool {
        self.document
            .as_ref()
            .is_some_and(|document| !document.definitions.is_empty())
            || self.schema.is_some()
            || self.raw_sdl.as_ref().is_some_and(|sdl| !sdl.trim().is_empty())
    }

    /// The richest form available: parsed document, then schema, then raw SDL.
    pub fn into_type_source(self) -> Option<TypeSource> {
        if let Some(document) = self.document {
            return Some(TypeSource::Document(document));
        }

        if let Some(schema) = self.schema {
            return Some(TypeSource::Schema(schema));
        }

        self.raw_sdl.map(TypeSource::Sdl)
    }
}
