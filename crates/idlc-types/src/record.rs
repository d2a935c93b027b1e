//! Emission records: the compiler's structured output.
//!
//! One [`InterfaceRecord`] is produced per compiled interface and read (never
//! modified) by the renderer. Every field is a named slot holding a string,
//! a boolean, or a nested structure; [`InterfaceRecord::to_value`] exposes
//! the same data as a JSON mapping.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub interface_name: String,
    pub v8_class: String,
    pub cpp_class: String,
    pub parent_interface: Option<String>,
    pub is_callback: bool,

    // ── Interface policy ──
    pub conditional_string: Option<String>,
    pub runtime_enabled_function: Option<String>,
    pub measure_as: Option<String>,
    pub is_check_security: bool,
    pub is_active_dom_object: bool,
    pub is_dependent_lifetime: bool,
    pub do_not_check_constants: bool,
    pub special_wrap_for: Vec<String>,
    pub has_custom_wrap: bool,
    pub has_custom_to_v8: bool,
    pub has_custom_legacy_call_as_function: bool,
    pub has_visit_dom_wrapper: bool,
    pub generate_visit_dom_wrapper_function: Option<String>,

    // ── Construction ──
    pub has_constructor: bool,
    pub has_custom_constructor: bool,
    pub has_event_constructor: bool,
    pub is_constructor_raises_exception: bool,
    pub is_constructor_call_with_document: bool,
    pub is_constructor_call_with_execution_context: bool,
    pub constructor_arguments: Vec<String>,
    /// Value of the constructor's `length` property.
    pub length: usize,

    // ── Members ──
    pub constants: Vec<ConstantRecord>,
    pub attributes: Vec<AttributeRecord>,
    pub methods: Vec<OperationRecord>,

    // ── Aggregates (computed after every member is compiled) ──
    pub has_any_type_attributes: bool,
    pub has_per_context_enabled_attributes: bool,
    pub has_replaceable_attributes: bool,
    pub has_runtime_enabled_attributes: bool,
    pub has_static_attributes: bool,
    pub has_per_context_enabled_methods: bool,
    pub has_runtime_enabled_methods: bool,
    pub has_method_configuration: bool,
    pub has_origin_safe_method_setter: bool,
    pub has_runtime_enabled_constants: bool,
    pub installed_attributes: String,
    pub number_of_attributes: String,

    // ── Dependencies ──
    pub header_includes: BTreeSet<String>,
    pub cpp_includes: BTreeSet<String>,

    /// Side-table descriptor for this interface, when one was supplied.
    pub metadata: Option<serde_json::Value>,
}

impl InterfaceRecord {
    /// The record as a JSON slot mapping.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeRecord> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Methods called `name`, in declaration order.
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a OperationRecord> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// The overload group anchored on a method called `name`.
    pub fn overload_group(&self, name: &str, is_static: bool) -> Option<&OverloadGroup> {
        self.methods
            .iter()
            .filter(|m| m.name == name && m.is_static == is_static)
            .find_map(|m| m.overloads.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstantRecord {
    pub name: String,
    pub reflected_name: String,
    /// Literal ready for emission (string constants re-quoted).
    pub value: String,
    pub runtime_enabled_function: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub name: String,
    pub idl_type: String,
    pub cpp_type: String,
    pub v8_type: String,
    pub is_static: bool,
    pub is_read_only: bool,
    pub is_nullable: bool,

    // ── Accessors ──
    pub has_setter: bool,
    pub has_custom_getter: bool,
    pub has_custom_setter: bool,
    pub getter_callback_name: String,
    pub setter_callback_name: String,
    pub getter_callback_name_for_main_world: String,
    pub setter_callback_name_for_main_world: String,
    pub world_suffixes: Vec<String>,

    // ── Policy ──
    pub is_getter_raises_exception: bool,
    pub is_setter_raises_exception: bool,
    /// Reads are cached by pinning the wrapper to the owner.
    pub is_keep_alive_for_gc: bool,
    pub cached_attribute_validation_method: Option<String>,
    pub is_replaceable: bool,
    pub is_reflect: bool,
    pub is_unforgeable: bool,
    pub is_check_security_for_node: bool,
    pub has_strict_type_checking: bool,
    pub is_per_world_bindings: bool,
    pub access_control_list: Vec<String>,
    pub property_attributes: Vec<String>,
    pub runtime_enabled_function_name: Option<String>,
    pub per_context_enabled_function_name: Option<String>,
    pub activity_logging_world_list_for_getter: Vec<String>,
    pub activity_logging_world_list_for_setter: Vec<String>,
    pub conditional_string: Option<String>,
    pub measure_as: Option<String>,
    pub deprecate_as: Option<String>,

    // ── Generated code ──
    pub cpp_value: Option<String>,
    pub cpp_value_original: Option<String>,
    pub v8_set_return_value: Option<String>,
    pub cpp_setter: Option<String>,
    pub v8_value_to_local_cpp_value: Option<String>,
    pub enum_validation_expression: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentRecord {
    pub name: String,
    pub index: usize,
    pub idl_type: String,
    pub cpp_type: String,
    pub is_optional: bool,
    pub is_variadic: bool,
    pub is_nullable: bool,
    pub is_strict_type_checking: bool,
    pub has_default: bool,
    /// Statement declaring the local native value.
    pub v8_value_to_local_cpp_value: String,
}

/// One AND-clause of an overload dispatch predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchClause {
    pub argument_count: usize,
    /// Matches `argument_count` or more (variadic tail).
    pub at_least: bool,
    /// Per-position type guards, in argument order.
    pub type_checks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverloadGroup {
    pub name: String,
    /// Indices into [`InterfaceRecord::methods`], declaration order.
    pub method_indices: Vec<usize>,
    pub minimum_number_of_required_arguments: usize,
}

impl OverloadGroup {
    pub fn size(&self) -> usize {
        self.method_indices.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub name: String,
    pub idl_type: String,
    pub cpp_type: Option<String>,
    pub is_static: bool,
    pub is_custom: bool,
    pub is_raises_exception: bool,
    pub callback_name: String,
    pub cpp_method: String,
    pub v8_set_return_value: Option<String>,
    pub arguments: Vec<ArgumentRecord>,
    pub number_of_arguments: usize,
    pub number_of_required_arguments: usize,
    pub is_variadic: bool,

    // ── Policy ──
    pub is_check_security_for_frame: bool,
    pub is_check_security_for_node: bool,
    pub is_do_not_check_security: bool,
    pub is_do_not_check_signature: bool,
    pub is_per_world_bindings: bool,
    pub is_read_only: bool,
    pub property_attributes: Vec<String>,
    pub runtime_enabled_function_name: Option<String>,
    pub per_context_enabled_function_name: Option<String>,
    pub activity_logging_world_list: Vec<String>,
    pub conditional_string: Option<String>,
    pub measure_as: Option<String>,
    pub deprecate_as: Option<String>,
    pub do_generate_method_configuration: bool,

    // ── Overloads ──
    pub overload_index: Option<usize>,
    pub overload_resolution_expression: Option<String>,
    pub overload_clauses: Vec<DispatchClause>,
    /// Present only on the last member of a group.
    pub overloads: Option<OverloadGroup>,
    pub overload_limitation: Option<String>,
}

impl OperationRecord {
    /// Prefix of every generated function for this method. Static methods
    /// get a `Static` infix so `f` and `static f` never share a symbol.
    pub fn function_stem(&self) -> String {
        if self.is_static {
            format!("{}Static", self.name)
        } else {
            self.name.clone()
        }
    }
}
