//! Overload Resolution Compiler, driven through the full pipeline.

use std::collections::BTreeSet;

use idlc_compiler::{compile, overload, InterfacesInfo, TypeRegistry};
use idlc_types::record::InterfaceRecord;

fn record(source: &str) -> InterfaceRecord {
    compile(source, "Widget.idl", &TypeRegistry::empty(), &InterfacesInfo::new())
        .unwrap_or_else(|errors| panic!("{errors}"))
        .record
}

/// Argument counts accepted by each overload, in declaration order.
fn arities(record: &InterfaceRecord, name: &str) -> Vec<Vec<usize>> {
    record
        .methods_named(name)
        .map(|m| m.overload_clauses.iter().map(|c| c.argument_count).collect())
        .collect()
}

#[test]
fn three_overloads_cover_every_arity() {
    let record = record(
        "interface Widget { void f(); void f(long a); void f(long a, optional long b); };",
    );
    let per_overload = arities(&record, "f");
    assert_eq!(per_overload, vec![vec![0], vec![1], vec![1, 2]]);

    for arity in 0..=2 {
        for (position, counts) in per_overload.iter().enumerate() {
            let matching = counts.iter().filter(|&&c| c == arity).count();
            assert!(matching <= 1, "overload {position} has duplicate clauses for {arity}");
        }
        assert!(
            per_overload.iter().any(|counts| counts.contains(&arity)),
            "arity {arity} is not dispatched"
        );
    }

    let group = record.overload_group("f", false).unwrap();
    assert_eq!(group.size(), 3);
    assert_eq!(group.method_indices, vec![0, 1, 2]);
    assert_eq!(group.minimum_number_of_required_arguments, 0);
}

#[test]
fn indices_follow_declaration_order() {
    let record = record(
        "interface Widget { void f(long a); void g(); void f(DOMString s, long b); };",
    );
    let indices: Vec<Option<usize>> = record.methods.iter().map(|m| m.overload_index).collect();
    assert_eq!(indices, vec![Some(1), None, Some(2)]);
    assert!(record.methods[0].overloads.is_none());
    assert!(record.methods[2].overloads.is_some());
    assert_eq!(record.methods[1].overload_resolution_expression, None);
}

#[test]
fn static_and_instance_members_group_separately() {
    let record = record("interface Widget { void f(); static void f(long a); };");
    assert!(record.overload_group("f", false).is_none());
    assert!(record.overload_group("f", true).is_none());
    assert!(record.methods.iter().all(|m| m.overload_index.is_none()));
}

#[test]
fn static_and_instance_namesakes_get_distinct_symbols() {
    let output = compile(
        "interface Widget { void f(); static void f(long a); };",
        "Widget.idl",
        &TypeRegistry::empty(),
        &InterfacesInfo::new(),
    )
    .unwrap_or_else(|errors| panic!("{errors}"));
    let callbacks: Vec<&str> = output.record.methods.iter().map(|m| m.callback_name.as_str()).collect();
    assert_eq!(
        callbacks,
        vec!["WidgetV8Internal::fMethodCallback", "WidgetV8Internal::fStaticMethodCallback"]
    );

    let source = &output.source;
    for symbol in ["fMethod", "fMethodCallback", "fStaticMethod", "fStaticMethodCallback"] {
        let definition = format!("static void {symbol}(const v8::FunctionCallbackInfo<v8::Value>& info)");
        assert_eq!(source.matches(&definition).count(), 1, "{symbol}");
    }
    assert!(source.contains("WidgetV8Internal::fStaticMethod(info);"));
}

#[test]
fn type_guards_distinguish_equal_arity() {
    let record = record(
        "interface Widget { void put(Node n); void put(sequence<long> values); void put(long x); };",
    );
    let clauses: Vec<String> = record
        .methods_named("put")
        .map(|m| overload::render_clause(&m.overload_clauses[0]))
        .collect();
    assert_eq!(
        clauses[0],
        "(info.Length() == 1) && (V8Node::hasInstance(info[0], info.GetIsolate(), worldType(info.GetIsolate())))"
    );
    assert_eq!(clauses[1], "(info.Length() == 1) && (info[0]->IsArray())");
    assert_eq!(clauses[2], "(info.Length() == 1)");
}

#[test]
fn variadic_overload_uses_lower_bound() {
    let record = record("interface Widget { void log(); void log(DOMString first, DOMString... rest); };");
    let variadic = record.methods_named("log").nth(1).unwrap();
    assert_eq!(variadic.overload_clauses.len(), 1);
    assert!(variadic.overload_clauses[0].at_least);
    assert_eq!(
        variadic.overload_resolution_expression.as_deref(),
        Some("((info.Length() >= 1))")
    );
    assert_eq!(
        record.overload_group("log", false).unwrap().minimum_number_of_required_arguments,
        0
    );
}

#[test]
fn dispatch_predicates_are_stable() {
    let source = "interface Widget { void f(); void f(long a); void f(long a, optional long b); };";
    let reference = record(source);
    let mut seen = BTreeSet::new();
    for _ in 0..100 {
        let again = record(source);
        assert_eq!(again.methods, reference.methods);
        seen.insert(
            again
                .methods
                .iter()
                .filter_map(|m| m.overload_resolution_expression.clone())
                .collect::<Vec<_>>()
                .join("|"),
        );
    }
    assert_eq!(seen.len(), 1);
}
