//! Compact representation of the list and required (non-null) wrappers around a GraphQL named type.
//!
//! A `[String!]` is a named type `String` with a required inner wrapping and one nullable list
//! wrapping. Everything fits in a single `u32`: the inner required flag, the number of list
//! wrappings and one required flag per list, innermost list first.

use std::fmt;

const INNER_IS_REQUIRED: u32 = 1;
const LIST_COUNT_SHIFT: u32 = 1;
const LIST_COUNT_MASK: u32 = 0b1111 << LIST_COUNT_SHIFT;
const LIST_FLAGS_SHIFT: u32 = 5;

/// Maximum number of nested lists a [`Wrapping`] can hold.
pub const MAX_LIST_WRAPPINGS: u32 = 15;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Wrapping(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListWrapping {
    RequiredList,
    NullableList,
}

impl ListWrapping {
    pub fn is_required(self) -> bool {
        matches!(self, ListWrapping::RequiredList)
    }
}

impl Wrapping {
    /// A nullable named type: `T`.
    pub fn nullable() -> Self {
        Wrapping(0)
    }

    /// A required named type: `T!`.
    pub fn required() -> Self {
        Wrapping(INNER_IS_REQUIRED)
    }

    pub fn new(inner_is_required: bool) -> Self {
        if inner_is_required {
            Self::required()
        } else {
            Self::nullable()
        }
    }

    /// Wraps the current type in a nullable list: `T` becomes `[T]`.
    #[must_use]
    pub fn list(self) -> Self {
        self.push_list(false)
    }

    /// Wraps the current type in a required list: `T` becomes `[T]!`.
    #[must_use]
    pub fn list_non_null(self) -> Self {
        self.push_list(true)
    }

    pub fn wrap_list(&mut self) {
        *self = self.list();
    }

    pub fn wrap_list_non_null(&mut self) {
        *self = self.list_non_null();
    }

    /// Makes the outermost wrapper required: `[T]` becomes `[T]!`, `T` becomes `T!`.
    #[must_use]
    pub fn wrap_non_null(self) -> Self {
        self.with_outermost_required(true)
    }

    /// Makes the outermost wrapper nullable: `[T]!` becomes `[T]`, `T!` becomes `T`.
    #[must_use]
    pub fn without_non_null(self) -> Self {
        self.with_outermost_required(false)
    }

    /// Removes the outermost list, `[[T]!]` becomes `[T]!`. Returns `None` if there is no list.
    #[must_use]
    pub fn without_list(self) -> Option<Self> {
        let mut wrapping = self;
        wrapping.pop_outermost_list_wrapping().map(|_| wrapping)
    }

    pub fn pop_outermost_list_wrapping(&mut self) -> Option<ListWrapping> {
        let count = self.list_depth();
        if count == 0 {
            return None;
        }

        let bit = 1 << (LIST_FLAGS_SHIFT + count - 1);
        let wrapping = if self.0 & bit != 0 {
            ListWrapping::RequiredList
        } else {
            ListWrapping::NullableList
        };

        self.0 &= !bit;
        self.set_list_depth(count - 1);

        Some(wrapping)
    }

    /// Whether the outermost wrapper is required.
    pub fn is_required(self) -> bool {
        match self.list_depth() {
            0 => self.inner_is_required(),
            count => self.0 & (1 << (LIST_FLAGS_SHIFT + count - 1)) != 0,
        }
    }

    pub fn is_nullable(self) -> bool {
        !self.is_required()
    }

    pub fn inner_is_required(self) -> bool {
        self.0 & INNER_IS_REQUIRED != 0
    }

    pub fn is_list(self) -> bool {
        self.list_depth() > 0
    }

    pub fn list_depth(self) -> u32 {
        (self.0 & LIST_COUNT_MASK) >> LIST_COUNT_SHIFT
    }

    /// List wrappings from the outermost to the innermost one.
    pub fn list_wrappings(self) -> impl Iterator<Item = ListWrapping> + ExactSizeIterator {
        let count = self.list_depth();
        (0..count).rev().map(move |i| {
            if self.0 & (1 << (LIST_FLAGS_SHIFT + i)) != 0 {
                ListWrapping::RequiredList
            } else {
                ListWrapping::NullableList
            }
        })
    }

    /// Formats the wrapping around `name`, e.g. `[String!]!`.
    pub fn type_display(self, name: &str) -> impl fmt::Display + '_ {
        TypeDisplay { wrapping: self, name }
    }

    /// Whether a value of `other` can be used where `self` is expected without breaking the
    /// nullability contract: same list structure and `self` is never more required than `other`.
    pub fn is_equal_or_more_lenient_than(self, other: Wrapping) -> bool {
        if self.list_depth() != other.list_depth() {
            return false;
        }

        if self.inner_is_required() && !other.inner_is_required() {
            return false;
        }

        self.list_wrappings()
            .zip(other.list_wrappings())
            .all(|(ours, theirs)| !ours.is_required() || theirs.is_required())
    }

    fn push_list(self, required: bool) -> Self {
        let count = self.list_depth();
        if count >= MAX_LIST_WRAPPINGS {
            return self;
        }

        let mut wrapping = self;
        if required {
            wrapping.0 |= 1 << (LIST_FLAGS_SHIFT + count);
        }
        wrapping.set_list_depth(count + 1);
        wrapping
    }

    fn set_list_depth(&mut self, count: u32) {
        self.0 = (self.0 & !LIST_COUNT_MASK) | (count << LIST_COUNT_SHIFT);
    }

    fn with_outermost_required(self, required: bool) -> Self {
        let bit = match self.list_depth() {
            0 => INNER_IS_REQUIRED,
            count => 1 << (LIST_FLAGS_SHIFT + count - 1),
        };

        if required {
            Wrapping(self.0 | bit)
        } else {
            Wrapping(self.0 & !bit)
        }
    }
}

struct TypeDisplay<'a> {
    wrapping: Wrapping,
    name: &'a str,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.wrapping.list_depth() {
            f.write_str("[")?;
        }

        f.write_str(self.name)?;

        if self.wrapping.inner_is_required() {
            f.write_str("!")?;
        }

        let wrappings: Vec<_> = self.wrapping.list_wrappings().collect();
        for wrapping in wrappings.into_iter().rev() {
            f.write_str("]")?;
            if wrapping.is_required() {
                f.write_str("!")?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Wrapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Wrapping").field(&self.type_display("T").to_string()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Wrapping::nullable().type_display("String").to_string(), "String");
        assert_eq!(Wrapping::required().type_display("String").to_string(), "String!");
        assert_eq!(
            Wrapping::required().list().type_display("String").to_string(),
            "[String!]"
        );
        assert_eq!(
            Wrapping::nullable().list_non_null().list().type_display("Int").to_string(),
            "[[Int]!]"
        );
        assert_eq!(
            Wrapping::required()
                .list_non_null()
                .list_non_null()
                .type_display("ID")
                .to_string(),
            "[[ID!]!]!"
        );
    }

    #[test]
    fn outermost_required() {
        let wrapping = Wrapping::nullable().list_non_null();
        assert!(wrapping.is_required());
        assert!(!wrapping.inner_is_required());

        let wrapping = wrapping.without_non_null();
        assert!(wrapping.is_nullable());
        assert_eq!(wrapping, Wrapping::nullable().list());

        assert_eq!(Wrapping::nullable().wrap_non_null(), Wrapping::required());
    }

    #[test]
    fn pop_list_wrappings() {
        let mut wrapping = Wrapping::required().list().list_non_null();
        assert_eq!(
            wrapping.list_wrappings().collect::<Vec<_>>(),
            vec![ListWrapping::RequiredList, ListWrapping::NullableList]
        );

        assert_eq!(wrapping.pop_outermost_list_wrapping(), Some(ListWrapping::RequiredList));
        assert_eq!(wrapping, Wrapping::required().list());
        assert_eq!(wrapping.pop_outermost_list_wrapping(), Some(ListWrapping::NullableList));
        assert_eq!(wrapping, Wrapping::required());
        assert_eq!(wrapping.pop_outermost_list_wrapping(), None);

        assert_eq!(Wrapping::nullable().without_list(), None);
    }

    #[test]
    fn leniency() {
        let nullable = Wrapping::nullable().list();
        let required = Wrapping::required().list_non_null();

        assert!(nullable.is_equal_or_more_lenient_than(required));
        assert!(!required.is_equal_or_more_lenient_than(nullable));
        assert!(required.is_equal_or_more_lenient_than(required));
        assert!(!Wrapping::nullable().is_equal_or_more_lenient_than(nullable));
    }

    #[test]
    fn serializes_as_integer() {
        let wrapping = Wrapping::required().list();
        let json = serde_json::to_string(&wrapping).unwrap();
        let back: Wrapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, wrapping);
    }
}
