//! Overload Resolution Compiler.
//!
//! Same-named operations with the same staticness form an overload group.
//! Each member gets a dispatch predicate: an OR of clauses, each an exact
//! argument count plus per-position type guards. This is the simplified
//! scheme, not full effective-overload-set resolution; dispatch order is
//! declaration order.

use std::collections::BTreeMap;

use idlc_types::ast::{Argument, Operation};
use idlc_types::record::{DispatchClause, OperationRecord, OverloadGroup};
use idlc_types::Span;

use crate::classify::{Classification, Classifier};

/// A signature shape the dispatch scheme cannot resolve reliably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverloadLimitation {
    pub method: String,
    pub message: String,
    pub span: Span,
}

/// Annotate overloaded members of `methods` in place. `operations` is the
/// parallel list of source operations.
pub(crate) fn resolve_overloads(
    classifier: &Classifier<'_>,
    operations: &[Operation],
    methods: &mut [OperationRecord],
) -> Vec<OverloadLimitation> {
    let mut limitations = resolve_by_staticness(classifier, operations, methods, false);
    limitations.extend(resolve_by_staticness(classifier, operations, methods, true));
    limitations
}

fn resolve_by_staticness(
    classifier: &Classifier<'_>,
    operations: &[Operation],
    methods: &mut [OperationRecord],
    is_static: bool,
) -> Vec<OverloadLimitation> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, method) in methods.iter().enumerate() {
        if method.is_static == is_static {
            groups.entry(method.name.clone()).or_default().push(index);
        }
    }

    let mut limitations = Vec::new();
    for (name, indices) in groups {
        if indices.len() < 2 {
            continue;
        }
        for (position, &index) in indices.iter().enumerate() {
            let operation = &operations[index];
            let (clauses, limitation) = dispatch_clauses(classifier, operation);
            let method = &mut methods[index];
            method.overload_index = Some(position + 1);
            method.overload_resolution_expression = Some(resolution_expression(&clauses));
            method.overload_clauses = clauses;
            if let Some(message) = limitation {
                method.overload_limitation = Some(message.clone());
                limitations.push(OverloadLimitation {
                    method: name.clone(),
                    message,
                    span: operation.span,
                });
            }
        }

        let minimum = indices
            .iter()
            .map(|&i| methods[i].number_of_required_arguments)
            .min()
            .unwrap_or(0);
        let last = indices[indices.len() - 1];
        methods[last].overloads = Some(OverloadGroup {
            name,
            method_indices: indices,
            minimum_number_of_required_arguments: minimum,
        });
    }
    limitations
}

// ══════════════════════════════════════════════════════════════════════════════
// Clauses
// ══════════════════════════════════════════════════════════════════════════════

/// Clauses for one operation, plus a limitation message when the signature
/// mixes optional and variadic arguments.
pub(crate) fn dispatch_clauses(
    classifier: &Classifier<'_>,
    operation: &Operation,
) -> (Vec<DispatchClause>, Option<String>) {
    let arguments = &operation.arguments;
    let is_variadic = arguments.last().is_some_and(|a| a.is_variadic);
    let has_optional = arguments.iter().any(|a| a.is_optional);

    // One clause per omission point.
    let mut clauses: Vec<DispatchClause> = arguments
        .iter()
        .enumerate()
        .filter(|(_, argument)| argument.is_optional)
        .map(|(count, _)| clause(classifier, arguments, count, false))
        .collect();

    let mut limitation = None;
    match (is_variadic, has_optional) {
        (false, _) => clauses.push(clause(classifier, arguments, arguments.len(), false)),
        (true, false) => {
            let required = arguments.len() - 1;
            clauses.push(clause(classifier, arguments, required, true));
        }
        (true, true) => {
            limitation = Some(format!(
                "'{}' combines optional and variadic arguments; overload dispatch may not select it",
                operation.name.name
            ));
        }
    }
    (clauses, limitation)
}

fn clause(
    classifier: &Classifier<'_>,
    arguments: &[Argument],
    argument_count: usize,
    at_least: bool,
) -> DispatchClause {
    let type_checks = arguments[..argument_count]
        .iter()
        .enumerate()
        .filter_map(|(index, argument)| argument_check(classifier, index, argument))
        .collect();
    DispatchClause {
        argument_count,
        at_least,
        type_checks,
    }
}

fn argument_check(classifier: &Classifier<'_>, index: usize, argument: &Argument) -> Option<String> {
    let value = format!("info[{index}]");
    let strict = argument.extended_attributes.contains("StrictTypeChecking");
    match classifier.classify(&argument.idl_type) {
        Classification::StringLike if strict => Some(format!(
            "{value}->IsNull() || {value}->IsUndefined() || {value}->IsString() || {value}->IsObject()"
        )),
        Classification::Sequence(_) | Classification::Array(_) => Some(format!("{value}->IsArray()")),
        _ if classifier.is_wrapper_reference(&argument.idl_type) => {
            let name = classifier.interface_name(&argument.idl_type)?;
            let check = format!(
                "V8{name}::hasInstance({value}, info.GetIsolate(), worldType(info.GetIsolate()))"
            );
            if argument.is_nullable {
                Some(format!("{value}->IsNull() || {check}"))
            } else {
                Some(check)
            }
        }
        _ => None,
    }
}

/// Render one clause: `(info.Length() == n) && (guard) && ...`.
pub fn render_clause(clause: &DispatchClause) -> String {
    let comparison = if clause.at_least { ">=" } else { "==" };
    std::iter::once(format!("info.Length() {comparison} {}", clause.argument_count))
        .chain(clause.type_checks.iter().cloned())
        .map(|check| format!("({check})"))
        .collect::<Vec<_>>()
        .join(" && ")
}

/// Render the OR of all clauses.
pub fn resolution_expression(clauses: &[DispatchClause]) -> String {
    clauses
        .iter()
        .map(|c| format!("({})", render_clause(c)))
        .collect::<Vec<_>>()
        .join(" || ")
}
