//! Immutable registry of named types known to the whole build.
//!
//! A [`TypeRegistry`] is populated once from every description file taking
//! part in a build, then shared read-only by every compile. There is no
//! process-wide state: each entry point receives the snapshot explicitly.

use std::collections::{BTreeMap, BTreeSet};

use idlc_types::ast::Definitions;
use idlc_types::IdlType;

/// Typedef chains longer than this are treated as cyclic and left unresolved.
const MAX_TYPEDEF_DEPTH: usize = 32;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeRegistry {
    enums: BTreeMap<String, Vec<String>>,
    callback_functions: BTreeSet<String>,
    typedefs: BTreeMap<String, IdlType>,
    interfaces: BTreeSet<String>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    pub fn is_callback_function(&self, name: &str) -> bool {
        self.callback_functions.contains(name)
    }

    pub fn typedef(&self, name: &str) -> Option<&IdlType> {
        self.typedefs.get(name)
    }

    pub fn knows_interface(&self, name: &str) -> bool {
        self.interfaces.contains(name)
    }

    /// A new snapshot holding everything in `self` plus `defs`.
    pub fn extended_with(&self, defs: &Definitions) -> TypeRegistry {
        TypeRegistryBuilder {
            inner: self.clone(),
        }
        .add_definitions(defs)
        .build()
    }

    /// Replace typedef names anywhere inside `ty` with their targets.
    pub fn resolve_typedefs(&self, ty: &IdlType) -> IdlType {
        self.resolve_at_depth(ty, 0)
    }

    fn resolve_at_depth(&self, ty: &IdlType, depth: usize) -> IdlType {
        if depth > MAX_TYPEDEF_DEPTH {
            return ty.clone();
        }
        match ty {
            IdlType::Named(name) => match self.typedefs.get(name) {
                Some(target) => self.resolve_at_depth(target, depth + 1),
                None => ty.clone(),
            },
            IdlType::Sequence(inner) => IdlType::sequence(self.resolve_at_depth(inner, depth + 1)),
            IdlType::Array(inner) => IdlType::array(self.resolve_at_depth(inner, depth + 1)),
            IdlType::Union(members) => IdlType::Union(
                members
                    .iter()
                    .map(|m| self.resolve_at_depth(m, depth + 1))
                    .collect(),
            ),
        }
    }
}

/// Collects registry entries before freezing them into a [`TypeRegistry`].
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    inner: TypeRegistry,
}

impl TypeRegistryBuilder {
    /// Register every enum, callback function, typedef and interface name
    /// declared in `defs`.
    pub fn add_definitions(mut self, defs: &Definitions) -> Self {
        for def in &defs.enums {
            self = self.enum_type(&def.name.name, def.values.iter().cloned());
        }
        for def in &defs.callback_functions {
            self = self.callback_function(&def.name.name);
        }
        for def in &defs.typedefs {
            self = self.typedef(&def.name.name, def.idl_type.clone());
        }
        for iface in &defs.interfaces {
            self = self.interface(&iface.name.name);
        }
        self
    }

    pub fn enum_type(mut self, name: &str, values: impl IntoIterator<Item = String>) -> Self {
        self.inner
            .enums
            .insert(name.to_string(), values.into_iter().collect());
        self
    }

    pub fn callback_function(mut self, name: &str) -> Self {
        self.inner.callback_functions.insert(name.to_string());
        self
    }

    pub fn typedef(mut self, name: &str, target: IdlType) -> Self {
        self.inner.typedefs.insert(name.to_string(), target);
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.inner.interfaces.insert(name.to_string());
        self
    }

    pub fn build(self) -> TypeRegistry {
        self.inner
    }
}
