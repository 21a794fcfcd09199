use std::{fmt, sync::Arc};

use async_graphql_value::Name;

/// One key of a response path: a response key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Field(Name),
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl From<Name> for PathSegment {
    fn from(name: Name) -> Self {
        PathSegment::Field(name)
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(Name::new(name))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{index}"),
            PathSegment::Field(name) => f.write_str(name),
        }
    }
}

/// Backward linked path from the operation root to the field being resolved.
///
/// Each node owns a reference to its parent, so children can be created cheaply while the
/// parent is shared between concurrently resolving siblings. Nodes are never mutated.
#[derive(Clone, Default)]
pub struct ResponsePath(Option<Arc<PathNode>>);

struct PathNode {
    prev: ResponsePath,
    key: PathSegment,
    typename: Option<Name>,
}

impl ResponsePath {
    pub fn root() -> Self {
        ResponsePath(None)
    }

    #[must_use]
    pub fn child(&self, key: impl Into<PathSegment>, typename: Option<&Name>) -> Self {
        ResponsePath(Some(Arc::new(PathNode {
            prev: self.clone(),
            key: key.into(),
            typename: typename.cloned(),
        })))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    pub fn key(&self) -> Option<&PathSegment> {
        self.0.as_ref().map(|node| &node.key)
    }

    /// Name of the parent type of the field this node was created for.
    pub fn typename(&self) -> Option<&Name> {
        self.0.as_ref().and_then(|node| node.typename.as_ref())
    }

    pub fn prev(&self) -> Option<&ResponsePath> {
        self.0.as_ref().map(|node| &node.prev)
    }

    pub fn to_vec(&self) -> Vec<PathSegment> {
        let mut segments = Vec::new();
        let mut current = self;

        while let Some(node) = &current.0 {
            segments.push(node.key.clone());
            current = &node.prev;
        }

        segments.reverse();
        segments
    }
}

impl fmt::Debug for ResponsePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_segments_from_root() {
        let query = Name::new("Query");
        let root = ResponsePath::root();
        let users = root.child("users", Some(&query));
        let first = users.child(0_usize, None);
        let name = first.child("name", Some(&Name::new("User")));

        assert_eq!(
            name.to_vec(),
            vec![
                PathSegment::from("users"),
                PathSegment::Index(0),
                PathSegment::from("name")
            ]
        );
        assert_eq!(name.typename().map(Name::as_str), Some("User"));
        assert_eq!(users.to_vec().len(), 1);
        assert!(root.to_vec().is_empty());
    }

    #[test]
    fn serializes_like_a_graphql_path() {
        let path = ResponsePath::root().child("a", None).child(2_usize, None);
        let json = serde_json::to_value(path.to_vec()).unwrap();
        assert_eq!(json, serde_json::json!(["a", 2]));
    }
}
