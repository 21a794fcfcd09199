use schema::{ast, ConstValue, FieldError, Name, PathSegment, Pos, Positioned, ResponsePath};

/// Error entry of a GraphQL response.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    // Serialized as a map, kept as a list of entries.
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "serialize_extensions")]
    pub extensions: Vec<(Name, ConstValue)>,
}

fn serialize_extensions<S: serde::Serializer>(
    extensions: &[(Name, ConstValue)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(extensions.iter().map(|(key, value)| (key, value)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<Pos> for Location {
    fn from(pos: Pos) -> Self {
        Location {
            line: pos.line,
            column: pos.column,
        }
    }
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        GraphqlError {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<Location>) -> Self {
        self.locations.push(location.into());
        self
    }

    #[must_use]
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = Location>) -> Self {
        self.locations.extend(locations);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: &ResponsePath) -> Self {
        self.path = Some(path.to_vec());
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl AsRef<str>, value: impl Into<ConstValue>) -> Self {
        self.extensions.push((Name::new(key), value.into()));
        self
    }

    /// Resolver failure at a field, carrying the resolver's extensions.
    pub(crate) fn from_field_error(
        error: FieldError,
        field_nodes: &[&Positioned<ast::Field>],
        path: &ResponsePath,
    ) -> Self {
        GraphqlError::from(error)
            .with_locations(field_nodes.iter().map(|field| field.pos.into()))
            .with_path(path)
    }

    /// Error located at a set of field nodes.
    pub(crate) fn at_field(
        message: impl Into<String>,
        field_nodes: &[&Positioned<ast::Field>],
        path: &ResponsePath,
    ) -> Self {
        GraphqlError::new(message)
            .with_locations(field_nodes.iter().map(|field| field.pos.into()))
            .with_path(path)
    }
}

impl From<FieldError> for GraphqlError {
    fn from(error: FieldError) -> Self {
        GraphqlError {
            message: error.message,
            locations: Vec::new(),
            path: None,
            extensions: error.extensions.into_iter().flatten().collect(),
        }
    }
}

impl std::fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_only_present_members() {
        let path = ResponsePath::root().child("users", None).child(0_usize, None);
        let error = GraphqlError::new("boom")
            .with_location(Pos { line: 1, column: 3 })
            .with_path(&path)
            .with_extension("code", "BAD");

        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({
                "message": "boom",
                "locations": [{"line": 1, "column": 3}],
                "path": ["users", 0],
                "extensions": {"code": "BAD"}
            })
        );

        assert_eq!(
            serde_json::to_value(GraphqlError::new("plain")).unwrap(),
            serde_json::json!({"message": "plain"})
        );
    }
}
