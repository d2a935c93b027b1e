//! Member Compiler: operations.

use std::collections::BTreeSet;

use idlc_types::ast::{Argument, Operation};
use idlc_types::record::{ArgumentRecord, OperationRecord};

use crate::attributes::integer_policy;
use crate::context::{check_conflicts, unsupported, MemberContext};
use crate::conversion::ConversionOptions;
use crate::error::Result;
use crate::ext_attrs::ExtendedAttributes;
use crate::utilities::{self, cpp_name};

/// Compile one operation, adding the headers it needs to `includes`.
///
/// Overload fields are left empty; [`crate::overload`] fills them once the
/// whole member list is known.
pub(crate) fn compile_operation(
    cx: &MemberContext<'_>,
    operation: &Operation,
    includes: &mut BTreeSet<String>,
) -> Result<OperationRecord> {
    let name = operation.name.name.as_str();
    let attrs = ExtendedAttributes::from_list(&operation.extended_attributes);
    check_conflicts(name, operation.span, &attrs)?;

    let is_custom = attrs.custom.is_some();
    let is_raises_exception = attrs.raises_exception.is_some();
    let classifier = &cx.classifier;
    let return_type = &operation.return_type;

    let mut arguments = Vec::with_capacity(operation.arguments.len());
    for (index, argument) in operation.arguments.iter().enumerate() {
        arguments.push(compile_argument(cx, operation, &attrs, argument, index, is_custom, includes)?);
    }

    let (cpp_type, v8_set_return_value) = if is_custom || return_type.is("void") {
        (None, None)
    } else {
        let cpp_type = classifier
            .cpp_type(return_type, false)
            .map_err(|err| unsupported(name, operation.span, err))?;
        let mut options = ConversionOptions::default();
        if !operation.is_static {
            options = options.with_script_wrappable("imp");
        }
        let statement = classifier
            .set_return_value(return_type, "result", &options)
            .map_err(|err| unsupported(name, operation.span, err))?;
        includes.extend(classifier.includes_for_type(return_type));
        includes.extend(statement.includes);
        (Some(cpp_type), Some(statement.expr))
    };

    if is_raises_exception {
        includes.insert("bindings/v8/ExceptionMessages.h".to_string());
        includes.insert("bindings/v8/ExceptionState.h".to_string());
    }

    let is_check_security_for_frame =
        cx.interface_attrs.check_security && !attrs.do_not_check_security;
    if is_check_security_for_frame || attrs.check_security_for_node {
        includes.insert("bindings/v8/BindingSecurity.h".to_string());
    }

    let is_do_not_check_signature = !(operation.is_static
        || attrs.do_not_check_security
        || attrs.do_not_check_signature
        || attrs.not_enumerable
        || attrs.read_only
        || attrs.runtime_enabled.is_some()
        || attrs.unforgeable);

    let number_of_required_arguments = operation
        .arguments
        .iter()
        .take_while(|a| !a.is_optional && !a.is_variadic)
        .count();

    let mut record = OperationRecord {
        name: name.to_string(),
        idl_type: return_type.to_string(),
        cpp_type,
        is_static: operation.is_static,
        is_custom,
        is_raises_exception,
        callback_name: String::new(),
        cpp_method: cpp_method(cx, operation, &attrs, &arguments, is_raises_exception),
        v8_set_return_value: v8_set_return_value.filter(|s| !s.is_empty()),
        number_of_arguments: arguments.len(),
        number_of_required_arguments,
        is_variadic: operation.arguments.last().is_some_and(|a| a.is_variadic),
        arguments,
        is_check_security_for_frame,
        is_check_security_for_node: attrs.check_security_for_node,
        is_do_not_check_security: attrs.do_not_check_security,
        is_do_not_check_signature,
        is_per_world_bindings: attrs.per_world_bindings,
        is_read_only: attrs.read_only,
        property_attributes: property_attributes(&attrs),
        runtime_enabled_function_name: utilities::runtime_enabled_function_name(&attrs),
        per_context_enabled_function_name: utilities::per_context_enabled_function_name(&attrs),
        activity_logging_world_list: utilities::activity_logging_world_list(&attrs, None, includes),
        conditional_string: utilities::conditional_string(&attrs),
        measure_as: utilities::measure_as(&attrs, includes),
        deprecate_as: utilities::deprecate_as(&attrs, includes),
        do_generate_method_configuration: false,
        overload_index: None,
        overload_resolution_expression: None,
        overload_clauses: Vec::new(),
        overloads: None,
        overload_limitation: None,
    };
    record.callback_name = format!(
        "{}::{}MethodCallback",
        cx.internal_namespace(),
        record.function_stem()
    );
    Ok(record)
}

fn compile_argument(
    cx: &MemberContext<'_>,
    operation: &Operation,
    method_attrs: &ExtendedAttributes,
    argument: &Argument,
    index: usize,
    is_custom: bool,
    includes: &mut BTreeSet<String>,
) -> Result<ArgumentRecord> {
    let name = &argument.name.name;
    let attrs = ExtendedAttributes::from_list(&argument.extended_attributes);
    check_conflicts(name, argument.span, &attrs)?;
    let classifier = &cx.classifier;
    let idl_type = &argument.idl_type;
    let member = format!("{}({name})", operation.name.name);

    // Custom operations convert their own arguments.
    let (cpp_type, statement) = if is_custom {
        let cpp_type = classifier
            .cpp_type(idl_type, true)
            .unwrap_or_else(|_| "ScriptValue".to_string());
        (cpp_type, String::new())
    } else {
        let options = ConversionOptions::default().with_integer_conversion(integer_policy(&attrs));
        let conversion = if argument.is_variadic {
            classifier.variadic_statement(idl_type, name, index, &options)
        } else {
            classifier.to_native_statement(idl_type, &format!("info[{index}]"), name, &options)
        }
        .map_err(|err| unsupported(&member, argument.span, err))?;
        let cpp_type = classifier
            .cpp_type(idl_type, true)
            .map_err(|err| unsupported(&member, argument.span, err))?;
        includes.extend(conversion.includes);
        (cpp_type, conversion.expr)
    };

    Ok(ArgumentRecord {
        name: name.clone(),
        index,
        idl_type: idl_type.to_string(),
        cpp_type,
        is_optional: argument.is_optional,
        is_variadic: argument.is_variadic,
        is_nullable: argument.is_nullable,
        is_strict_type_checking: (attrs.strict_type_checking || method_attrs.strict_type_checking)
            && classifier.is_interface_type(idl_type),
        has_default: argument.default_value.is_some(),
        v8_value_to_local_cpp_value: statement,
    })
}

/// `imp->name(args)`, or `Interface::name(args)` for static operations.
fn cpp_method(
    cx: &MemberContext<'_>,
    operation: &Operation,
    attrs: &ExtendedAttributes,
    arguments: &[ArgumentRecord],
    is_raises_exception: bool,
) -> String {
    let mut call_arguments = utilities::call_with_arguments(&attrs.call_with);
    call_arguments.extend(arguments.iter().map(|a| a.name.clone()));
    if is_raises_exception {
        call_arguments.push("es".to_string());
    }
    let method_name = cpp_name(&operation.name.name, attrs);
    let receiver = if operation.is_static {
        format!("{}::", cx.cpp_class)
    } else {
        "imp->".to_string()
    };
    format!("{receiver}{method_name}({})", call_arguments.join(", "))
}

fn property_attributes(attrs: &ExtendedAttributes) -> Vec<String> {
    let mut list = Vec::new();
    if attrs.not_enumerable {
        list.push("v8::DontEnum".to_string());
    }
    if attrs.read_only {
        list.push("v8::ReadOnly".to_string());
    }
    if !list.is_empty() {
        list.insert(0, "v8::DontDelete".to_string());
    }
    list
}
