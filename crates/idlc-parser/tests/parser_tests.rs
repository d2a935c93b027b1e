//! Parser tests: definitions, members, types, extended attributes and
//! error recovery.

use idlc_parser::parse_source;
use idlc_types::ast::*;
use idlc_types::{CompileErrors, ErrorCode, IdlType, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse(source: &str) -> (Option<Definitions>, CompileErrors) {
    let sf = SourceFile::new("test.idl", source);
    let result = parse_source(&sf);
    (result.definitions, result.errors)
}

fn parse_ok(source: &str) -> Definitions {
    let (defs, errors) = parse(source);
    assert!(!errors.has_errors(), "unexpected errors:\n{errors}");
    defs.expect("definitions")
}

fn parse_interface(source: &str) -> Interface {
    let defs = parse_ok(source);
    assert_eq!(defs.interfaces.len(), 1);
    defs.interfaces.into_iter().next().unwrap()
}

fn error_codes(source: &str) -> Vec<ErrorCode> {
    let (defs, errors) = parse(source);
    assert!(defs.is_none());
    errors.errors.iter().map(|e| e.code).collect()
}

// ─────────────────────────────────────────────────────────────────────
// Interfaces
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_interface() {
    let iface = parse_interface("interface Widget {};");
    assert_eq!(iface.name.name, "Widget");
    assert!(iface.parent.is_none());
    assert!(!iface.is_partial);
    assert!(!iface.is_callback);
}

#[test]
fn test_interface_with_parent() {
    let iface = parse_interface("interface HTMLWidgetElement : HTMLElement {};");
    assert_eq!(iface.parent.map(|p| p.name).as_deref(), Some("HTMLElement"));
}

#[test]
fn test_partial_and_callback_interfaces() {
    let defs = parse_ok(
        "partial interface Widget { attribute long extra; };\n\
         callback interface WidgetListener { void handle(Widget w); };",
    );
    assert!(defs.interfaces[0].is_partial);
    assert!(defs.interfaces[1].is_callback);
    assert_eq!(defs.partials_of("Widget").count(), 1);
    assert!(defs.interface("Widget").is_none());
    assert!(defs.interface("WidgetListener").is_some());
}

#[test]
fn test_interface_span_covers_declaration() {
    let iface = parse_interface("[Constructor]\ninterface A {\n};");
    assert_eq!(iface.span.line, 2);
    assert_eq!(iface.span.end_line, 3);
}

// ─────────────────────────────────────────────────────────────────────
// Members
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_attributes() {
    let iface = parse_interface(
        "interface Widget {\n\
           readonly attribute DOMString id;\n\
           static attribute long count;\n\
           attribute Node? owner;\n\
           inherit attribute boolean hidden;\n\
         };",
    );
    let attrs = &iface.attributes;
    assert_eq!(attrs.len(), 4);
    assert!(attrs[0].is_read_only && !attrs[0].is_static);
    assert_eq!(attrs[0].idl_type, IdlType::named("DOMString"));
    assert!(attrs[1].is_static);
    assert!(attrs[2].is_nullable);
    assert_eq!(attrs[3].name.name, "hidden");
}

#[test]
fn test_operations_and_arguments() {
    let iface = parse_interface(
        "interface Widget {\n\
           void resize(long w, optional long h);\n\
           static Widget create();\n\
           DOMString? format(DOMString... parts);\n\
           void paint(optional DOMString color = \"red\", optional long alpha = 255);\n\
         };",
    );
    let ops = &iface.operations;
    assert_eq!(ops.len(), 4);
    assert_eq!(ops[0].name.name, "resize");
    assert_eq!(ops[0].return_type, IdlType::named("void"));
    assert!(!ops[0].arguments[0].is_optional);
    assert!(ops[0].arguments[1].is_optional);
    assert!(ops[1].is_static);
    assert!(ops[1].arguments.is_empty());
    assert!(ops[2].is_nullable);
    assert!(ops[2].arguments[0].is_variadic);
    assert_eq!(ops[3].arguments[0].default_value.as_deref(), Some("\"red\""));
    assert_eq!(ops[3].arguments[1].default_value.as_deref(), Some("255"));
}

#[test]
fn test_overloads_keep_declaration_order() {
    let iface = parse_interface(
        "interface Widget { void f(); void f(long a); void f(long a, optional long b); };",
    );
    let arities: Vec<usize> = iface.operations.iter().map(|o| o.arguments.len()).collect();
    assert_eq!(arities, vec![0, 1, 2]);
}

#[test]
fn test_constants() {
    let iface = parse_interface(
        "interface Widget {\n\
           const unsigned short SMALL = 1;\n\
           const long MASK = 0xFF;\n\
           const double RATIO = 1.5;\n\
           const DOMString LABEL = \"wide\";\n\
           const boolean ENABLED = true;\n\
         };",
    );
    let values: Vec<&str> = iface.constants.iter().map(|c| c.value.as_str()).collect();
    assert_eq!(values, vec!["1", "0xFF", "1.5", "wide", "true"]);
    assert_eq!(iface.constants[0].idl_type, IdlType::named("unsigned short"));
}

#[test]
fn test_keyword_as_member_name() {
    let iface = parse_interface("interface W { attribute long static; void callback(long enum); };");
    assert_eq!(iface.attributes[0].name.name, "static");
    assert_eq!(iface.operations[0].name.name, "callback");
    assert_eq!(iface.operations[0].arguments[0].name.name, "enum");
}

// ─────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────

fn attr_type(type_text: &str) -> IdlType {
    let iface = parse_interface(&format!("interface T {{ attribute {type_text} a; }};"));
    iface.attributes[0].idl_type.clone()
}

#[test]
fn test_multi_word_primitives() {
    assert_eq!(attr_type("unsigned long long"), IdlType::named("unsigned long long"));
    assert_eq!(attr_type("long long"), IdlType::named("long long"));
    assert_eq!(attr_type("unsigned short"), IdlType::named("unsigned short"));
    assert_eq!(attr_type("unrestricted double"), IdlType::named("unrestricted double"));
}

#[test]
fn test_composite_types() {
    assert_eq!(
        attr_type("sequence<Node>"),
        IdlType::sequence(IdlType::named("Node"))
    );
    assert_eq!(attr_type("long[]"), IdlType::array(IdlType::named("long")));
    assert_eq!(
        attr_type("(DOMString or sequence<long>)"),
        IdlType::Union(vec![
            IdlType::named("DOMString"),
            IdlType::sequence(IdlType::named("long")),
        ])
    );
}

#[test]
fn test_parsed_types_match_text_parser() {
    for text in ["sequence<unsigned long long>", "Node[][]", "(A or B or C)"] {
        assert_eq!(attr_type(text), IdlType::parse(text).unwrap(), "{text}");
    }
}

#[test]
fn test_malformed_type_syntax() {
    let codes = error_codes("interface T { attribute sequence<long a; };");
    assert_eq!(codes.first(), Some(&ErrorCode::MALFORMED_TYPE_SYNTAX));
    let codes = error_codes("interface T { attribute (A or B a; };");
    assert_eq!(codes.first(), Some(&ErrorCode::MALFORMED_TYPE_SYNTAX));
    let codes = error_codes("interface T { attribute long[ a; };");
    assert_eq!(codes.first(), Some(&ErrorCode::MALFORMED_TYPE_SYNTAX));
}

// ─────────────────────────────────────────────────────────────────────
// Extended attributes
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_extended_attribute_forms() {
    let iface = parse_interface(
        "[Constructor(DOMString name, optional long size), Custom=Wrap|ToV8, Conditional=A&B, \
          ActiveDOMObject, ImplementedAs=\"WidgetImpl\"]\n\
         interface Widget {};",
    );
    let ext = &iface.extended_attributes;
    let ctor = ext.iter().find(|a| a.name == "Constructor").unwrap();
    assert_eq!(ctor.arguments.as_ref().map(Vec::len), Some(2));
    assert_eq!(ext.get("Custom"), Some(Some("Wrap|ToV8")));
    assert_eq!(ext.get("Conditional"), Some(Some("A&B")));
    assert_eq!(ext.get("ActiveDOMObject"), Some(None));
    assert_eq!(ext.get("ImplementedAs"), Some(Some("WidgetImpl")));
    assert_eq!(ext.get("Missing"), None);
}

#[test]
fn test_member_and_argument_extended_attributes() {
    let iface = parse_interface(
        "interface W {\n\
           [Reflect=class, RaisesException=Setter] attribute DOMString className;\n\
           void f([EnforceRange] long x, [Clamp] optional octet y);\n\
         };",
    );
    assert_eq!(
        iface.attributes[0].extended_attributes.get("Reflect"),
        Some(Some("class"))
    );
    let args = &iface.operations[0].arguments;
    assert!(args[0].extended_attributes.contains("EnforceRange"));
    assert!(args[1].extended_attributes.contains("Clamp"));
    assert!(args[1].is_optional);
}

// ─────────────────────────────────────────────────────────────────────
// Enums, callbacks, typedefs
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_enum_callback_typedef() {
    let defs = parse_ok(
        "enum Mode { \"open\", \"closed\", };\n\
         callback WidgetCallback = void (Widget w, optional long code);\n\
         typedef sequence<Widget> WidgetList;",
    );
    assert_eq!(defs.enums[0].values, vec!["open", "closed"]);
    assert_eq!(defs.callback_functions[0].name.name, "WidgetCallback");
    assert_eq!(defs.callback_functions[0].arguments.len(), 2);
    assert_eq!(
        defs.typedefs[0].idl_type,
        IdlType::sequence(IdlType::named("Widget"))
    );
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unexpected_top_level_token() {
    assert_eq!(error_codes("attribute long x;"), vec![ErrorCode::UNEXPECTED_TOKEN]);
}

#[test]
fn test_recovers_after_bad_member() {
    let (defs, errors) = parse(
        "interface A {\n\
           attribute ; \n\
           readonly long x;\n\
           attribute long ok;\n\
         };\n\
         interface B {};",
    );
    assert!(defs.is_none());
    assert_eq!(errors.total_errors, 2);
    assert_eq!(errors.errors[0].span.line, 2);
    assert_eq!(errors.errors[1].span.line, 3);
}

#[test]
fn test_lexer_errors_fail_the_parse() {
    let (defs, errors) = parse("interface A { attribute long x; }; /* open");
    assert!(defs.is_none());
    assert_eq!(errors.errors[0].code, ErrorCode::UNTERMINATED);
}

#[test]
fn test_determinism_100_iterations() {
    let source = "interface Widget { readonly attribute DOMString id; void resize(long w); };";
    let first = parse_ok(source);
    for _ in 0..100 {
        assert_eq!(parse_ok(source), first);
    }
}
