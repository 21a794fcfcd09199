use std::path::{Path, PathBuf};

use schema::parse_schema;

use crate::{LoadOptions, Loader, LoaderError, Source};

const EXTENSIONS: [&str; 4] = ["graphql", "graphqls", "gql", "gqls"];

/// Loads SDL files, relative pointers being resolved against [`LoadOptions::cwd`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphQLFileLoader;

impl GraphQLFileLoader {
    fn resolve(pointer: &str, options: &LoadOptions) -> PathBuf {
        let path = Path::new(pointer);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            options.cwd.join(path)
        }
    }

    fn has_graphql_extension(pointer: &str) -> bool {
        Path::new(pointer)
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| EXTENSIONS.contains(&extension))
    }
}

#[async_trait::async_trait]
impl Loader for GraphQLFileLoader {
    fn loader_id(&self) -> &'static str {
        "graphql-file"
    }

    async fn can_load(&self, pointer: &str, options: &LoadOptions) -> bool {
        if !Self::has_graphql_extension(pointer) {
            return false;
        }

        tokio::fs::try_exists(Self::resolve(pointer, options))
            .await
            .unwrap_or_default()
    }

    async fn load(&self, pointer: &str, options: &LoadOptions) -> Result<Vec<Source>, LoaderError> {
        let path = Self::resolve(pointer, options);
        let location = path.display().to_string();

        let sdl = tokio::fs::read_to_string(&path).await.map_err(|error| LoaderError::Io {
            path: location.clone(),
            message: error.to_string(),
        })?;

        if sdl.trim().is_empty() {
            tracing::debug!(location, "skipping empty GraphQL file");
            return Ok(Vec::new());
        }

        let document = parse_schema(&sdl).map_err(|error| LoaderError::Parse {
            location: location.clone(),
            message: error.to_string(),
        })?;

        Ok(vec![Source {
            document: Some(document),
            schema: None,
            raw_sdl: Some(sdl),
            location: (!options.no_location).then_some(location),
        }])
    }
}
