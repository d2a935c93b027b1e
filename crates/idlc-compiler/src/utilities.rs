//! Naming and policy helpers shared by the member and interface compilers.

use std::collections::BTreeSet;

use crate::ext_attrs::ExtendedAttributes;

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn uncapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `value` as a double-quoted C++ string literal.
pub fn cpp_string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            literal.push('\\');
        }
        literal.push(ch);
    }
    literal.push('"');
    literal
}

/// Native name of a member or interface, honoring `[ImplementedAs]`.
pub fn cpp_name<'a>(name: &'a str, attrs: &'a ExtendedAttributes) -> &'a str {
    attrs.implemented_as.as_deref().unwrap_or(name)
}

// ── [CallWith] ──

/// Leading native arguments for `[CallWith]` values, in a fixed order.
pub fn call_with_arguments(values: &[String]) -> Vec<String> {
    const ORDER: &[(&str, &str)] = &[
        ("ScriptState", "&state"),
        ("ExecutionContext", "scriptContext"),
        ("ScriptArguments", "scriptArguments.release()"),
        ("ActiveWindow", "activeDOMWindow()"),
        ("FirstWindow", "firstDOMWindow()"),
    ];
    ORDER
        .iter()
        .filter(|(tag, _)| values.iter().any(|v| v == tag))
        .map(|(_, argument)| argument.to_string())
        .collect()
}

// ── [Conditional] ──

/// Preprocessor guard for `[Conditional=A&B]` or `[Conditional=A|B]`.
pub fn conditional_string(attrs: &ExtendedAttributes) -> Option<String> {
    let value = attrs.conditional.as_deref()?;
    let (separator, joiner) = if value.contains('&') {
        ('&', " && ")
    } else {
        ('|', " || ")
    };
    let guards: Vec<String> = value
        .split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| format!("ENABLE({part})"))
        .collect();
    if guards.is_empty() {
        None
    } else {
        Some(guards.join(joiner))
    }
}

// ── [ActivityLogging] ──

/// Worlds in which `access_type` ("Getter", "Setter" or `None` for
/// methods) is logged. Empty when not logged.
pub fn activity_logging_world_list(
    attrs: &ExtendedAttributes,
    access_type: Option<&str>,
    includes: &mut BTreeSet<String>,
) -> Vec<String> {
    let Some(value) = attrs.activity_logging.as_deref() else {
        return Vec::new();
    };
    let applies = match access_type {
        Some(access) => value.starts_with("For") || value.starts_with("Access") || value.starts_with(access),
        None => true,
    };
    if !applies {
        return Vec::new();
    }
    includes.insert("bindings/v8/V8DOMActivityLogger.h".to_string());
    if value.ends_with("ForIsolatedWorlds") {
        vec![String::new()]
    } else {
        vec![String::new(), "ForMainWorld".to_string()]
    }
}

// ── Feature gating ──

pub fn runtime_enabled_function_name(attrs: &ExtendedAttributes) -> Option<String> {
    attrs
        .runtime_enabled
        .as_deref()
        .map(|feature| format!("RuntimeEnabledFeatures::{}Enabled", uncapitalize(feature)))
}

pub fn per_context_enabled_function_name(attrs: &ExtendedAttributes) -> Option<String> {
    attrs
        .per_context_enabled
        .as_deref()
        .map(|feature| format!("ContextFeatures::{}Enabled", uncapitalize(feature)))
}

// ── Use counting ──

pub fn measure_as(attrs: &ExtendedAttributes, includes: &mut BTreeSet<String>) -> Option<String> {
    let value = attrs.measure_as.clone()?;
    includes.insert("core/frame/UseCounter.h".to_string());
    Some(value)
}

pub fn deprecate_as(attrs: &ExtendedAttributes, includes: &mut BTreeSet<String>) -> Option<String> {
    let value = attrs.deprecate_as.clone()?;
    includes.insert("core/frame/UseCounter.h".to_string());
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_helpers() {
        assert_eq!(capitalize("className"), "ClassName");
        assert_eq!(uncapitalize("WebAudio"), "webAudio");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn string_literals_escape_quotes_and_backslashes() {
        assert_eq!(cpp_string_literal("plain"), "\"plain\"");
        assert_eq!(cpp_string_literal("a\"b"), "\"a\\\"b\"");
        assert_eq!(cpp_string_literal("c:\\d"), "\"c:\\\\d\"");
        assert_eq!(cpp_string_literal(""), "\"\"");
    }

    #[test]
    fn call_with_order_is_fixed() {
        let values = vec!["ActiveWindow".to_string(), "ScriptState".to_string()];
        assert_eq!(call_with_arguments(&values), vec!["&state", "activeDOMWindow()"]);
    }

    #[test]
    fn conditional_guards() {
        let mut attrs = ExtendedAttributes {
            conditional: Some("A&B".to_string()),
            ..Default::default()
        };
        assert_eq!(conditional_string(&attrs).as_deref(), Some("ENABLE(A) && ENABLE(B)"));
        attrs.conditional = Some("A|B".to_string());
        assert_eq!(conditional_string(&attrs).as_deref(), Some("ENABLE(A) || ENABLE(B)"));
        attrs.conditional = None;
        assert_eq!(conditional_string(&attrs), None);
    }

    #[test]
    fn activity_logging_worlds() {
        let mut includes = BTreeSet::new();
        let attrs = ExtendedAttributes {
            activity_logging: Some("SetterForIsolatedWorlds".to_string()),
            ..Default::default()
        };
        assert!(activity_logging_world_list(&attrs, Some("Getter"), &mut includes).is_empty());
        assert!(includes.is_empty());
        assert_eq!(
            activity_logging_world_list(&attrs, Some("Setter"), &mut includes),
            vec![String::new()]
        );
        assert!(includes.contains("bindings/v8/V8DOMActivityLogger.h"));
    }
}
