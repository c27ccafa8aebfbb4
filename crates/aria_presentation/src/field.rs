//! Field descriptors.
//!
//! Every presentation type is described by a static table of
//! [`FieldDescriptor`]s built from ordinary `const` data. Grammar profiles
//! reuse another type's table through [`PresentationType::base`] rather
//! than by copying descriptors.

use aria_core::Value;
use std::fmt;

/// Expected shape of a primitive field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Anything, including maps and lists
    Any,
    /// String scalar
    String,
    /// Integer scalar
    Integer,
    /// Boolean scalar
    Boolean,
    /// Integer or float scalar
    Number,
    /// Sequence of anything
    List,
    /// Mapping of anything
    Map,
}

impl PrimitiveType {
    /// Check if a raw value has this shape
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::String => matches!(value, Value::String(_)),
            Self::Integer => matches!(value, Value::Integer(_)),
            Self::Boolean => matches!(value, Value::Bool(_)),
            Self::Number => matches!(value, Value::Integer(_) | Value::Float(_)),
            Self::List => matches!(value, Value::List(_)),
            Self::Map => matches!(value, Value::Map(_)),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::List => "list",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

/// How a field's raw value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single primitive value
    Primitive(PrimitiveType),
    /// A list of primitive values
    PrimitiveList(PrimitiveType),
    /// A nested presentation
    Object,
    /// A list of nested presentations
    ObjectList,
    /// A map of name to nested presentation
    ObjectDict,
    /// A list of single-entry maps of name to nested presentation
    ObjectSequencedList,
}

impl FieldKind {
    /// Check if the field wraps nested presentations
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(
            self,
            Self::Object | Self::ObjectList | Self::ObjectDict | Self::ObjectSequencedList
        )
    }

    /// Short kind name for diagnostics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::PrimitiveList(_) => "primitive list",
            Self::Object => "object",
            Self::ObjectList => "object list",
            Self::ObjectDict => "object dict",
            Self::ObjectSequencedList => "sequenced object list",
        }
    }
}

/// Constant default of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// Boolean default
    Bool(bool),
    /// Integer default
    Integer(i64),
    /// String default
    Str(&'static str),
    /// Empty list default
    EmptyList,
    /// Empty map default
    EmptyMap,
}

impl DefaultValue {
    /// Materialize as a raw value
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::Integer(*i),
            Self::Str(s) => Value::String((*s).to_string()),
            Self::EmptyList => Value::List(Vec::new()),
            Self::EmptyMap => Value::map(),
        }
    }
}

/// Description of one field of a presentation type
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Raw key
    pub name: &'static str,
    /// Whether absence is an issue
    pub required: bool,
    /// Interpretation of the raw value
    pub kind: FieldKind,
    /// Nested presentation type for object kinds
    pub nested: Option<&'static PresentationType>,
    /// Value used when the raw key is absent
    pub default: Option<DefaultValue>,
}

impl FieldDescriptor {
    const fn new(name: &'static str, kind: FieldKind, nested: Option<&'static PresentationType>) -> Self {
        Self {
            name,
            required: false,
            kind,
            nested,
            default: None,
        }
    }

    /// A primitive field
    #[must_use]
    pub const fn primitive(name: &'static str, ty: PrimitiveType) -> Self {
        Self::new(name, FieldKind::Primitive(ty), None)
    }

    /// A list of primitives
    #[must_use]
    pub const fn primitive_list(name: &'static str, ty: PrimitiveType) -> Self {
        Self::new(name, FieldKind::PrimitiveList(ty), None)
    }

    /// A nested object
    #[must_use]
    pub const fn object(name: &'static str, nested: &'static PresentationType) -> Self {
        Self::new(name, FieldKind::Object, Some(nested))
    }

    /// A list of nested objects
    #[must_use]
    pub const fn object_list(name: &'static str, nested: &'static PresentationType) -> Self {
        Self::new(name, FieldKind::ObjectList, Some(nested))
    }

    /// A map of named nested objects
    #[must_use]
    pub const fn object_dict(name: &'static str, nested: &'static PresentationType) -> Self {
        Self::new(name, FieldKind::ObjectDict, Some(nested))
    }

    /// A sequenced list of named nested objects
    #[must_use]
    pub const fn sequenced(name: &'static str, nested: &'static PresentationType) -> Self {
        Self::new(name, FieldKind::ObjectSequencedList, Some(nested))
    }

    /// Mark as required
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set a default
    #[must_use]
    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// Schema of a typed view over a raw subtree
#[derive(Debug)]
pub struct PresentationType {
    /// Unique name, also the documentation registry key
    pub name: &'static str,
    /// Specification section documenting this type
    pub spec_section: Option<&'static str>,
    /// Own descriptors
    pub fields: &'static [FieldDescriptor],
    /// Descriptor table this type is composed onto
    pub base: Option<&'static PresentationType>,
    /// Field that a bare scalar raw value stands for
    pub short_form: Option<&'static str>,
    /// Type used for undeclared keys
    pub rest: Option<&'static PresentationType>,
}

impl PresentationType {
    /// Create a type from its descriptor table
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self {
            name,
            spec_section: None,
            fields,
            base: None,
            short_form: None,
            rest: None,
        }
    }

    /// Set the documenting specification section
    #[must_use]
    pub const fn section(mut self, section: &'static str) -> Self {
        self.spec_section = Some(section);
        self
    }

    /// Compose onto a base descriptor table
    #[must_use]
    pub const fn based_on(mut self, base: &'static PresentationType) -> Self {
        self.base = Some(base);
        self
    }

    /// Accept a scalar as shorthand for one field
    #[must_use]
    pub const fn short_form(mut self, field: &'static str) -> Self {
        self.short_form = Some(field);
        self
    }

    /// Validate undeclared keys as `rest`
    #[must_use]
    pub const fn rest(mut self, rest: &'static PresentationType) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Full descriptor set: base descriptors first, overridden by same-named
    /// own descriptors, followed by own new ones.
    #[must_use]
    pub fn descriptors(&self) -> Vec<&'static FieldDescriptor> {
        let mut merged: Vec<&'static FieldDescriptor> = match self.base {
            Some(base) => base.descriptors(),
            None => Vec::new(),
        };
        for own in self.fields {
            match merged.iter_mut().find(|d| d.name == own.name) {
                Some(slot) => *slot = own,
                None => merged.push(own),
            }
        }
        merged
    }

    /// Find the descriptor for a field name
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields
            .iter()
            .find(|d| d.name == name)
            .or_else(|| self.base.and_then(|base| base.descriptor(name)))
    }

    /// Nested presentation types reachable from this one, this one first
    #[must_use]
    pub fn reachable(&'static self) -> Vec<&'static PresentationType> {
        let mut seen: Vec<&'static PresentationType> = Vec::new();
        let mut stack = vec![self];
        while let Some(ty) = stack.pop() {
            if seen.iter().any(|s| std::ptr::eq(*s, ty)) {
                continue;
            }
            seen.push(ty);
            let nested = ty.descriptors().into_iter().filter_map(|d| d.nested);
            stack.extend(nested.chain(ty.rest).chain(ty.base).collect::<Vec<_>>().into_iter().rev());
        }
        seen
    }
}

impl PartialEq for PresentationType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static LEAF: PresentationType = PresentationType::new(
        "Leaf",
        &[FieldDescriptor::primitive("value", PrimitiveType::Integer).required()],
    );

    static BASE: PresentationType = PresentationType::new(
        "Base",
        &[
            FieldDescriptor::primitive("a", PrimitiveType::String),
            FieldDescriptor::primitive("b", PrimitiveType::String),
        ],
    );

    static CHILD: PresentationType = PresentationType::new(
        "Child",
        &[
            FieldDescriptor::primitive("b", PrimitiveType::Integer).required(),
            FieldDescriptor::object_dict("leaves", &LEAF),
        ],
    )
    .based_on(&BASE);

    #[test]
    fn test_primitive_type_accepts() {
        assert!(PrimitiveType::Number.accepts(&Value::Integer(1)));
        assert!(PrimitiveType::Number.accepts(&Value::Float(1.5)));
        assert!(!PrimitiveType::String.accepts(&Value::Integer(1)));
        assert!(PrimitiveType::Any.accepts(&Value::map()));
    }

    #[test]
    fn test_descriptors_merge_base() {
        let names: Vec<_> = CHILD.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a", "b", "leaves"]);

        let b = CHILD.descriptor("b").unwrap();
        assert!(b.required);
        assert_eq!(b.kind, FieldKind::Primitive(PrimitiveType::Integer));
        assert!(CHILD.descriptor("a").is_some());
        assert!(CHILD.descriptor("missing").is_none());
    }

    #[test]
    fn test_reachable() {
        let names: Vec<_> = CHILD.reachable().iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Child", "Leaf", "Base"]);
    }

    #[test]
    fn test_default_value() {
        assert_eq!(DefaultValue::Bool(true).to_value(), Value::Bool(true));
        assert_eq!(DefaultValue::Str("x").to_value(), Value::from("x"));
        assert_eq!(DefaultValue::EmptyMap.to_value(), Value::map());
    }
}
