//! Typed views over raw subtrees.
//!
//! A [`Presentation`] holds nothing but a borrowed raw subtree and its
//! static [`PresentationType`]. Every accessor reads the raw tree on each
//! call; nothing is cached.

use crate::field::{FieldDescriptor, FieldKind, PresentationType};
use aria_core::{CoreError, Location, Locator, Map, PathSegment, RawDocument, TreePath, Value};
use std::borrow::Cow;

/// Accessor misuse: the field is not declared, or has a different kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresentationError {
    /// The presentation type declares no such field
    #[error("{presentation} has no field \"{field}\"")]
    UnknownField {
        /// Presentation type name
        presentation: &'static str,
        /// Requested field
        field: String,
        /// Document being read
        locator: Locator,
    },

    /// The field exists but is not of the requested kind
    #[error("{presentation}.{field} is a {actual} field, not {expected}")]
    KindMismatch {
        /// Presentation type name
        presentation: &'static str,
        /// Requested field
        field: &'static str,
        /// Kind the caller asked for
        expected: &'static str,
        /// Declared kind
        actual: &'static str,
        /// Document being read
        locator: Locator,
    },
}

impl From<PresentationError> for CoreError {
    fn from(err: PresentationError) -> Self {
        let locator = match &err {
            PresentationError::UnknownField { locator, .. }
            | PresentationError::KindMismatch { locator, .. } => locator.clone(),
        };
        CoreError::Presentation {
            message: err.to_string(),
            locator,
        }
    }
}

/// Typed view of one raw subtree
#[derive(Debug, Clone)]
pub struct Presentation<'a> {
    document: &'a RawDocument,
    raw: &'a Value,
    ty: &'static PresentationType,
    path: TreePath,
}

impl<'a> Presentation<'a> {
    /// Wrap a raw subtree of `document` found at `path`
    #[must_use]
    pub fn wrap(
        document: &'a RawDocument,
        raw: &'a Value,
        ty: &'static PresentationType,
        path: TreePath,
    ) -> Self {
        Self {
            document,
            raw,
            ty,
            path,
        }
    }

    /// Wrap a whole document
    #[must_use]
    pub fn root(document: &'a RawDocument, ty: &'static PresentationType) -> Self {
        Self::wrap(document, &document.root, ty, TreePath::root())
    }

    /// The raw subtree
    #[must_use]
    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    /// The presentation type
    #[must_use]
    pub fn presentation_type(&self) -> &'static PresentationType {
        self.ty
    }

    /// Path of the subtree in the document
    #[must_use]
    pub fn path(&self) -> &TreePath {
        &self.path
    }

    /// The composed document
    #[must_use]
    pub fn document(&self) -> &'a RawDocument {
        self.document
    }

    /// Diagnostic location of this subtree
    #[must_use]
    pub fn location(&self) -> Location {
        self.document.location(&self.path)
    }

    /// Diagnostic location of one of this subtree's fields
    #[must_use]
    pub fn field_location(&self, name: &str) -> Location {
        self.document.location(&self.path.child(name))
    }

    /// Entry name when this presentation sits in a dict or sequenced list
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self.path.segments().last() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }

    /// Wrap a nested raw value
    #[must_use]
    pub fn nested(&self, raw: &'a Value, ty: &'static PresentationType, path: TreePath) -> Self {
        Self::wrap(self.document, raw, ty, path)
    }

    /// Raw value of a field, honoring the short form; null counts as absent.
    ///
    /// No descriptor check is made.
    #[must_use]
    pub fn raw_field(&self, name: &str) -> Option<&'a Value> {
        let value = match self.raw {
            Value::Map(map) => map.get(name),
            scalar if self.ty.short_form == Some(name) && scalar.is_scalar() => Some(scalar),
            _ => None,
        };
        value.filter(|v| !v.is_null())
    }

    fn descriptor(&self, name: &str) -> Result<&'static FieldDescriptor, PresentationError> {
        self.ty
            .descriptor(name)
            .ok_or_else(|| PresentationError::UnknownField {
                presentation: self.ty.name,
                field: name.to_string(),
                locator: self.document.locator.clone(),
            })
    }

    fn mismatch(&self, descriptor: &FieldDescriptor, expected: &'static str) -> PresentationError {
        PresentationError::KindMismatch {
            presentation: self.ty.name,
            field: descriptor.name,
            expected,
            actual: descriptor.kind.name(),
            locator: self.document.locator.clone(),
        }
    }

    fn primitive_descriptor(&self, name: &str) -> Result<&'static FieldDescriptor, PresentationError> {
        let descriptor = self.descriptor(name)?;
        match descriptor.kind {
            FieldKind::Primitive(_) | FieldKind::PrimitiveList(_) => Ok(descriptor),
            _ => Err(self.mismatch(descriptor, "primitive")),
        }
    }

    /// Primitive value with the descriptor default applied
    ///
    /// # Errors
    ///
    /// Returns error if the field is undeclared or not primitive
    pub fn value(&self, name: &str) -> Result<Option<Cow<'a, Value>>, PresentationError> {
        let descriptor = self.primitive_descriptor(name)?;
        Ok(match self.raw_field(name) {
            Some(value) => Some(Cow::Borrowed(value)),
            None => descriptor.default.map(|d| Cow::Owned(d.to_value())),
        })
    }

    /// String value with the descriptor default applied
    ///
    /// # Errors
    ///
    /// Returns error if the field is undeclared or not primitive
    pub fn string(&self, name: &str) -> Result<Option<&'a str>, PresentationError> {
        let descriptor = self.primitive_descriptor(name)?;
        Ok(match self.raw_field(name) {
            Some(value) => value.as_str(),
            None => match descriptor.default {
                Some(crate::field::DefaultValue::Str(s)) => Some(s),
                _ => None,
            },
        })
    }

    /// Boolean value with the descriptor default applied
    ///
    /// # Errors
    ///
    /// Returns error if the field is undeclared or not primitive
    pub fn boolean(&self, name: &str) -> Result<Option<bool>, PresentationError> {
        Ok(self.value(name)?.and_then(|v| v.as_bool()))
    }

    /// Integer value with the descriptor default applied
    ///
    /// # Errors
    ///
    /// Returns error if the field is undeclared or not primitive
    pub fn integer(&self, name: &str) -> Result<Option<i64>, PresentationError> {
        Ok(self.value(name)?.and_then(|v| v.as_i64()))
    }

    /// String items of a primitive list field
    ///
    /// # Errors
    ///
    /// Returns error if the field is undeclared or not primitive
    pub fn strings(&self, name: &str) -> Result<Vec<&'a str>, PresentationError> {
        self.primitive_descriptor(name)?;
        Ok(self
            .raw_field(name)
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default())
    }

    /// Map value of a primitive field (e.g. property assignments)
    ///
    /// # Errors
    ///
    /// Returns error if the field is undeclared or not primitive
    pub fn map(&self, name: &str) -> Result<Option<&'a Map>, PresentationError> {
        self.primitive_descriptor(name)?;
        Ok(self.raw_field(name).and_then(Value::as_map))
    }

    /// Nested presentation of an object field
    ///
    /// # Errors
    ///
    /// Returns error if the field is undeclared or not an object
    pub fn object(&self, name: &str) -> Result<Option<Presentation<'a>>, PresentationError> {
        let descriptor = self.descriptor(name)?;
        let (FieldKind::Object, Some(nested)) = (descriptor.kind, descriptor.nested) else {
            return Err(self.mismatch(descriptor, "object"));
        };
        Ok(self
            .raw_field(name)
            .map(|raw| self.nested(raw, nested, self.path.child(name))))
    }

    /// Nested presentations of a list, dict or sequenced-list field.
    ///
    /// Dict and sequenced entries are named by their key (see [`Self::name`]).
    /// Entries with the wrong raw shape are skipped; validation reports them.
    ///
    /// # Errors
    ///
    /// Returns error if the field is undeclared or not an object collection
    pub fn objects(&self, name: &str) -> Result<Vec<Presentation<'a>>, PresentationError> {
        let descriptor = self.descriptor(name)?;
        let nested = match (descriptor.kind, descriptor.nested) {
            (FieldKind::ObjectList | FieldKind::ObjectDict | FieldKind::ObjectSequencedList, Some(n)) => n,
            _ => return Err(self.mismatch(descriptor, "object collection")),
        };
        let Some(raw) = self.raw_field(name) else {
            return Ok(Vec::new());
        };
        let base = self.path.child(name);

        Ok(match (descriptor.kind, raw) {
            (FieldKind::ObjectList, Value::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.nested(item, nested, base.index(i)))
                .collect(),
            (FieldKind::ObjectDict, Value::Map(map)) => map
                .iter()
                .map(|(key, item)| self.nested(item, nested, base.child(key.as_str())))
                .collect(),
            (FieldKind::ObjectSequencedList, Value::List(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let map = item.as_map().filter(|m| m.len() == 1)?;
                    let (key, value) = map.iter().next()?;
                    Some(self.nested(value, nested, base.index(i).child(key.as_str())))
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Undeclared keys of this subtree wrapped as the type's `rest` presentation
    #[must_use]
    pub fn rest_entries(&self) -> Vec<Presentation<'a>> {
        let (Some(rest), Some(map)) = (self.ty.rest, self.raw.as_map()) else {
            return Vec::new();
        };
        map.iter()
            .filter(|(key, _)| self.ty.descriptor(key).is_none())
            .map(|(key, value)| self.nested(value, rest, self.path.child(key.as_str())))
            .collect()
    }
}
