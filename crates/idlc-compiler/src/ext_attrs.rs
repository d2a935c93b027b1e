//! Typed extended attributes.
//!
//! The tag list attached to a definition or member is read once into an
//! [`ExtendedAttributes`] record. Tags the compiler does not know land in
//! [`ExtendedAttributes::unrecognized`] and have no effect.

use std::collections::BTreeMap;

use idlc_types::ast::{Argument, ExtendedAttributeList};

/// A tag that may appear bare or with a value: `None` when absent,
/// `Some(None)` when bare.
pub type TagValue = Option<Option<String>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedAttributes {
    pub activity_logging: Option<String>,
    pub active_dom_object: bool,
    pub cached_attribute: Option<String>,
    pub call_with: Vec<String>,
    pub check_security: bool,
    pub check_security_for_node: bool,
    pub clamp: bool,
    pub conditional: Option<String>,
    /// `[Constructor]` or `[Constructor(args)]`.
    pub constructor: Option<Vec<Argument>>,
    pub constructor_call_with: Vec<String>,
    /// `[Custom]` values; empty when bare.
    pub custom: Option<Vec<String>>,
    pub custom_getter: bool,
    pub custom_setter: bool,
    pub dependent_lifetime: bool,
    pub deprecate_as: Option<String>,
    pub do_not_check_constants: bool,
    pub do_not_check_security: bool,
    pub do_not_check_security_on_getter: bool,
    pub do_not_check_security_on_setter: bool,
    pub do_not_check_signature: bool,
    pub enforce_range: bool,
    pub event_constructor: bool,
    pub generate_visit_dom_wrapper: Option<String>,
    pub getter_raises_exception: bool,
    pub implemented_as: Option<String>,
    pub keep_attribute_alive_for_gc: bool,
    pub measure_as: Option<String>,
    pub not_enumerable: bool,
    pub per_context_enabled: Option<String>,
    pub per_world_bindings: bool,
    pub put_forwards: Option<String>,
    pub raises_exception: TagValue,
    pub read_only: bool,
    pub reflect: TagValue,
    pub replaceable: bool,
    pub runtime_enabled: Option<String>,
    pub setter_call_with: Vec<String>,
    pub setter_raises_exception: bool,
    pub special_wrap_for: Vec<String>,
    pub strict_type_checking: bool,
    pub treat_null_as: Option<String>,
    pub unforgeable: bool,
    pub url: bool,
    pub unrecognized: BTreeMap<String, Option<String>>,
}

fn split_values(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(['|', '&'])
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl ExtendedAttributes {
    pub fn from_list(list: &ExtendedAttributeList) -> Self {
        let mut attrs = Self::default();
        for tag in list.iter() {
            let value = tag.value.clone();
            let text = tag.value.as_deref();
            match tag.name.as_str() {
                "ActivityLogging" => attrs.activity_logging = Some(value.unwrap_or_default()),
                "ActiveDOMObject" => attrs.active_dom_object = true,
                "CachedAttribute" => attrs.cached_attribute = Some(value.unwrap_or_default()),
                "CallWith" => attrs.call_with = split_values(text),
                "CheckSecurity" => attrs.check_security = true,
                "CheckSecurityForNode" => attrs.check_security_for_node = true,
                "Clamp" => attrs.clamp = true,
                "Conditional" => attrs.conditional = value,
                "Constructor" => {
                    attrs.constructor = Some(tag.arguments.clone().unwrap_or_default());
                }
                "ConstructorCallWith" => attrs.constructor_call_with = split_values(text),
                "Custom" => attrs.custom = Some(split_values(text)),
                "CustomGetter" => attrs.custom_getter = true,
                "CustomSetter" => attrs.custom_setter = true,
                "DependentLifetime" => attrs.dependent_lifetime = true,
                "DeprecateAs" => attrs.deprecate_as = value,
                "DoNotCheckConstants" => attrs.do_not_check_constants = true,
                "DoNotCheckSecurity" => attrs.do_not_check_security = true,
                "DoNotCheckSecurityOnGetter" => attrs.do_not_check_security_on_getter = true,
                "DoNotCheckSecurityOnSetter" => attrs.do_not_check_security_on_setter = true,
                "DoNotCheckSignature" => attrs.do_not_check_signature = true,
                "EnforceRange" => attrs.enforce_range = true,
                "EventConstructor" => attrs.event_constructor = true,
                "GenerateVisitDOMWrapper" => attrs.generate_visit_dom_wrapper = value,
                "GetterRaisesException" => attrs.getter_raises_exception = true,
                "ImplementedAs" => attrs.implemented_as = value,
                "KeepAttributeAliveForGC" => attrs.keep_attribute_alive_for_gc = true,
                "MeasureAs" => attrs.measure_as = value,
                "NotEnumerable" => attrs.not_enumerable = true,
                "PerContextEnabled" => attrs.per_context_enabled = value,
                "PerWorldBindings" => attrs.per_world_bindings = true,
                "PutForwards" => attrs.put_forwards = value,
                "RaisesException" => attrs.raises_exception = Some(value),
                "ReadOnly" => attrs.read_only = true,
                "Reflect" => attrs.reflect = Some(value),
                "Replaceable" => attrs.replaceable = true,
                "RuntimeEnabled" => attrs.runtime_enabled = value,
                "SetterCallWith" => attrs.setter_call_with = split_values(text),
                "SetterRaisesException" => attrs.setter_raises_exception = true,
                "SpecialWrapFor" => attrs.special_wrap_for = split_values(text),
                "StrictTypeChecking" => attrs.strict_type_checking = true,
                "TreatNullAs" => attrs.treat_null_as = value,
                "Unforgeable" => attrs.unforgeable = true,
                "URL" => attrs.url = true,
                other => {
                    attrs.unrecognized.insert(other.to_string(), value);
                }
            }
        }
        attrs
    }

    /// `[Custom]` bare, or `[Custom=...]` naming `value`.
    pub fn has_custom(&self, value: &str) -> bool {
        self.custom
            .as_ref()
            .is_some_and(|values| values.is_empty() || values.iter().any(|v| v == value))
    }

    /// `[Custom=...]` naming `value`; a bare tag does not count.
    pub fn has_custom_value(&self, value: &str) -> bool {
        self.custom
            .as_ref()
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    pub fn has_custom_getter(&self) -> bool {
        self.custom_getter || self.has_custom("Getter")
    }

    pub fn has_custom_setter(&self) -> bool {
        self.custom_setter || self.has_custom("Setter")
    }

    /// `[RaisesException]` bare, or with `value`.
    pub fn raises_exception_for(&self, value: &str) -> bool {
        match &self.raises_exception {
            Some(None) => true,
            Some(Some(v)) => v == value,
            None => false,
        }
    }

    pub fn raises_exception_value(&self) -> Option<&str> {
        self.raises_exception.as_ref().and_then(|v| v.as_deref())
    }

    pub fn is_reflect(&self) -> bool {
        self.reflect.is_some()
    }

    pub fn reflect_value(&self) -> Option<&str> {
        self.reflect.as_ref().and_then(|v| v.as_deref())
    }

    /// The first mutually exclusive tag pair present, if any.
    pub fn conflict(&self) -> Option<String> {
        if self.replaceable && self.has_custom_setter() {
            return Some("a custom setter cannot be combined with [Replaceable]".to_string());
        }
        if self.replaceable && self.put_forwards.is_some() {
            return Some("[PutForwards] cannot be combined with [Replaceable]".to_string());
        }
        if self.enforce_range && self.clamp {
            return Some("[EnforceRange] cannot be combined with [Clamp]".to_string());
        }
        if self.check_security_for_node && self.do_not_check_security {
            return Some(
                "[CheckSecurityForNode] cannot be combined with [DoNotCheckSecurity]".to_string(),
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idlc_types::ast::ExtendedAttribute;
    use idlc_types::Span;

    fn list(tags: &[(&str, Option<&str>)]) -> ExtendedAttributeList {
        ExtendedAttributeList {
            items: tags
                .iter()
                .map(|(name, value)| ExtendedAttribute {
                    name: name.to_string(),
                    value: value.map(str::to_string),
                    arguments: None,
                    span: Span::point(1, 1),
                })
                .collect(),
        }
    }

    #[test]
    fn reads_known_tags() {
        let attrs = ExtendedAttributes::from_list(&list(&[
            ("Reflect", None),
            ("CallWith", Some("ScriptState|ExecutionContext")),
            ("RaisesException", Some("Setter")),
            ("Custom", Some("Wrap|ToV8")),
        ]));
        assert!(attrs.is_reflect());
        assert_eq!(attrs.reflect_value(), None);
        assert_eq!(attrs.call_with, vec!["ScriptState", "ExecutionContext"]);
        assert!(attrs.raises_exception_for("Setter"));
        assert!(!attrs.raises_exception_for("Getter"));
        assert!(attrs.has_custom_value("ToV8"));
        assert!(!attrs.has_custom_getter());
    }

    #[test]
    fn unknown_tags_are_kept_aside() {
        let attrs = ExtendedAttributes::from_list(&list(&[("FutureTag", Some("x")), ("Clamp", None)]));
        assert!(attrs.clamp);
        assert_eq!(attrs.unrecognized.get("FutureTag"), Some(&Some("x".to_string())));
        assert!(attrs.conflict().is_none());
    }

    #[test]
    fn detects_conflicts() {
        let cases: &[&[(&str, Option<&str>)]] = &[
            &[("Replaceable", None), ("CustomSetter", None)],
            &[("Replaceable", None), ("Custom", None)],
            &[("Replaceable", None), ("PutForwards", Some("value"))],
            &[("EnforceRange", None), ("Clamp", None)],
            &[("CheckSecurityForNode", None), ("DoNotCheckSecurity", None)],
        ];
        for tags in cases {
            assert!(ExtendedAttributes::from_list(&list(tags)).conflict().is_some(), "{tags:?}");
        }
        let getter_only = ExtendedAttributes::from_list(&list(&[
            ("Replaceable", None),
            ("Custom", Some("Getter")),
        ]));
        assert!(getter_only.conflict().is_none());
    }
}
