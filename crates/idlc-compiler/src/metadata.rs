//! Cross-interface metadata side-table.
//!
//! Loaded once (usually from JSON) and consumed read-only. A missing entry
//! means "no extra metadata".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Descriptor for one interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implemented_as: Option<String>,
    #[serde(default)]
    pub is_callback_interface: bool,
    /// Keys this compiler does not interpret, preserved as given.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Interface name → descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfacesInfo {
    entries: BTreeMap<String, InterfaceInfo>,
}

impl InterfacesInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn insert(&mut self, name: impl Into<String>, info: InterfaceInfo) {
        self.entries.insert(name.into(), info);
    }

    pub fn get(&self, name: &str) -> Option<&InterfaceInfo> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_preserves_extra_keys() {
        let info = InterfacesInfo::from_json(
            r#"{
                "Gadget": {"include_path": "core/Gadget.h", "parent": "EventTarget", "dependencies": ["A.idl"]},
                "Listener": {"is_callback_interface": true}
            }"#,
        )
        .unwrap();
        assert_eq!(info.len(), 2);
        let gadget = info.get("Gadget").unwrap();
        assert_eq!(gadget.include_path.as_deref(), Some("core/Gadget.h"));
        assert_eq!(gadget.parent.as_deref(), Some("EventTarget"));
        assert!(gadget.extra.contains_key("dependencies"));
        assert!(info.get("Listener").unwrap().is_callback_interface);
        assert!(info.get("Missing").is_none());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(InterfacesInfo::from_json("[1, 2]").is_err());
    }
}
