use std::sync::Arc;

use futures::future::try_join_all;
use merge::merge_type_defs;
use schema::{build_ast_schema, Schema};

use crate::{GraphQLFileLoader, LoadOptions, Loader, LoaderError, SdlLoader, Source};

/// File and raw SDL loaders, files first.
pub fn default_loaders() -> Vec<Arc<dyn Loader>> {
    vec![Arc::new(GraphQLFileLoader), Arc::new(SdlLoader)]
}

/// Loads every pointer with the first loader that succeeds for it. Pointers are loaded
/// concurrently, sources come back in pointer order.
pub async fn load_type_defs<P>(
    pointers: impl IntoIterator<Item = P>,
    loaders: &[Arc<dyn Loader>],
    options: &LoadOptions,
) -> Result<Vec<Source>, LoaderError>
where
    P: AsRef<str>,
{
    let pointers = pointers
        .into_iter()
        .map(|pointer| pointer.as_ref().to_string())
        .collect::<Vec<_>>();

    let sources = try_join_all(
        pointers
            .iter()
            .map(|pointer| load_pointer(pointer, loaders, options)),
    )
    .await?
    .into_iter()
    .flatten()
    .filter(Source::has_definitions)
    .collect::<Vec<_>>();

    if sources.is_empty() {
        return Err(LoaderError::NoTypeDefinitions(pointers));
    }

    Ok(sources)
}

/// Loads and merges the type definitions of `pointers` into a schema.
pub async fn load_schema<P>(
    pointers: impl IntoIterator<Item = P>,
    loaders: &[Arc<dyn Loader>],
    options: &LoadOptions,
) -> Result<Schema, LoaderError>
where
    P: AsRef<str>,
{
    let sources = load_type_defs(pointers, loaders, options).await?;

    tracing::debug!(sources = sources.len(), "building schema from loaded sources");

    let document = merge_type_defs(
        sources.into_iter().filter_map(Source::into_type_source),
        &options.merge,
    )?;

    Ok(build_ast_schema(&document)?)
}

async fn load_pointer(
    pointer: &str,
    loaders: &[Arc<dyn Loader>],
    options: &LoadOptions,
) -> Result<Vec<Source>, LoaderError> {
    let mut errors = Vec::new();

    for loader in loaders {
        if !loader.can_load(pointer, options).await {
            continue;
        }

        match loader.load(pointer, options).await {
            Ok(sources) => {
                tracing::debug!(loader = loader.loader_id(), sources = sources.len(), "loaded pointer");
                return Ok(sources);
            }
            Err(error) => {
                tracing::debug!(loader = loader.loader_id(), %error, "loader failed");
                errors.push(error);
            }
        }
    }

    if errors.is_empty() {
        return Err(LoaderError::NoLoader(pointer.to_string()));
    }

    Err(LoaderError::Aggregate {
        pointer: pointer.to_string(),
        errors,
    })
}
