//! AST for interface description units.
//!
//! Member lists preserve declaration order; overload indices and clause
//! order are derived from it.

use crate::{IdlType, Span};

/// Everything declared in one description file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    pub interfaces: Vec<Interface>,
    pub enums: Vec<EnumDef>,
    pub callback_functions: Vec<CallbackFunction>,
    pub typedefs: Vec<Typedef>,
}

impl Definitions {
    /// The non-partial interface called `name`.
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces
            .iter()
            .find(|i| !i.is_partial && i.name.name == name)
    }

    /// Partial interfaces that extend `name`, in source order.
    pub fn partials_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Interface> {
        self.interfaces
            .iter()
            .filter(move |i| i.is_partial && i.name.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Extended attributes
// ══════════════════════════════════════════════════════════════════════════════

/// One `[Name]`, `[Name=Value]` or `[Name(args)]` tag as written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedAttribute {
    pub name: String,
    /// `None` means the tag is present without a value.
    pub value: Option<String>,
    /// Argument list for constructor-style tags.
    pub arguments: Option<Vec<Argument>>,
    pub span: Span,
}

/// Tags attached to a definition or member, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedAttributeList {
    pub items: Vec<ExtendedAttribute>,
}

impl ExtendedAttributeList {
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|a| a.name == name)
    }

    /// Value of the first tag called `name`; `Some(None)` for a bare tag.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.items
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtendedAttribute> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Definitions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: Ident,
    pub parent: Option<Ident>,
    pub is_partial: bool,
    pub is_callback: bool,
    pub attributes: Vec<Attribute>,
    pub operations: Vec<Operation>,
    pub constants: Vec<Constant>,
    pub extended_attributes: ExtendedAttributeList,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: Ident,
    pub idl_type: IdlType,
    pub is_read_only: bool,
    pub is_static: bool,
    pub is_nullable: bool,
    pub extended_attributes: ExtendedAttributeList,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: Ident,
    pub return_type: IdlType,
    pub is_static: bool,
    pub is_nullable: bool,
    pub arguments: Vec<Argument>,
    pub extended_attributes: ExtendedAttributeList,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Ident,
    pub idl_type: IdlType,
    pub is_optional: bool,
    pub is_variadic: bool,
    pub is_nullable: bool,
    pub default_value: Option<String>,
    pub extended_attributes: ExtendedAttributeList,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: Ident,
    pub idl_type: IdlType,
    /// Literal text; string constants arrive unquoted.
    pub value: String,
    pub extended_attributes: ExtendedAttributeList,
    pub span: Span,
}

/// `enum Name { "a", "b" };`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: Ident,
    pub values: Vec<String>,
    pub span: Span,
}

/// `callback Name = ReturnType (args);`
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackFunction {
    pub name: Ident,
    pub return_type: IdlType,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

/// `typedef Type Name;`
#[derive(Debug, Clone, PartialEq)]
pub struct Typedef {
    pub name: Ident,
    pub idl_type: IdlType,
    pub span: Span,
}
