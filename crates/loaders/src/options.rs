use std::path::PathBuf;

use merge::MergeTypeDefsConfig;

use crate::LoaderError;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct LoadOptions {
    /// Relative file pointers are resolved against this directory.
    pub cwd: PathBuf,
    /// Drop the location of loaded sources.
    pub no_location: bool,
    /// How `load_schema` merges the loaded documents.
    pub merge: MergeTypeDefsConfig,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            cwd: PathBuf::from("."),
            no_location: false,
            merge: MergeTypeDefsConfig::default(),
        }
    }
}

impl LoadOptions {
    pub fn from_toml(toml: &str) -> Result<Self, LoaderError> {
        toml::from_str(toml).map_err(|error| LoaderError::Config(error.to_string()))
    }

    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }
}
