use schema::parse_schema;

use crate::{LoadOptions, Loader, LoaderError, Source};

/// Accepts pointers that are SDL themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdlLoader;

#[async_trait::async_trait]
impl Loader for SdlLoader {
    fn loader_id(&self) -> &'static str {
        "sdl"
    }

    async fn can_load(&self, pointer: &str, _options: &LoadOptions) -> bool {
        !pointer.trim().is_empty() && parse_schema(pointer).is_ok()
    }

    async fn load(&self, pointer: &str, _options: &LoadOptions) -> Result<Vec<Source>, LoaderError> {
        let document = parse_schema(pointer).map_err(|error| LoaderError::Parse {
            location: "raw SDL".to_string(),
            message: error.to_string(),
        })?;

        Ok(vec![Source {
            document: Some(document),
            schema: None,
            raw_sdl: Some(pointer.to_string()),
            location: None,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn raw_sdl_is_loadable() {
        let options = LoadOptions::default();

        assert!(SdlLoader.can_load("type Query { a: Int }", &options).await);
        assert!(!SdlLoader.can_load("schema.graphql", &options).await);
        assert!(!SdlLoader.can_load("  ", &options).await);

        let sources = SdlLoader.load("type Query { a: Int }", &options).await.unwrap();
        assert_eq!(sources[0].raw_sdl.as_deref(), Some("type Query { a: Int }"));
        assert_eq!(sources[0].location, None);
    }
}
