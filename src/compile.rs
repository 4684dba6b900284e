//! Generic category compiler.
//!
//! A category such as `entities` is compiled against an ordered list of
//! subcategories. Each subcategory owns a lookup function that resolves the
//! value spec applying to one object ID. At check time the subcategories are
//! consulted in order and the first definite answer wins; if none has an
//! opinion the check is denied.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use tracing::debug;

use crate::error::PolicyError;
use crate::traits::PermissionLookup;
use crate::types::{EntitySubcategory, PolicyNode};

/// Resolve the value spec that applies to `object_id` within a subcategory schema.
pub type LookupFn =
    for<'a> fn(&dyn PermissionLookup, &'a PolicyNode, &str) -> Option<&'a PolicyNode>;

/// The lookup for the `all` subcategory: its schema applies to every object.
pub fn lookup_all<'a>(
    _lookup: &dyn PermissionLookup,
    schema: &'a PolicyNode,
    _object_id: &str,
) -> Option<&'a PolicyNode> {
    Some(schema)
}

/// A named subcategory and the function resolving it.
#[derive(Clone, Copy)]
pub struct Subcategory {
    name: &'static str,
    lookup: LookupFn,
}

impl Subcategory {
    pub(crate) fn new(name: &'static str, lookup: LookupFn) -> Self {
        Subcategory { name, lookup }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Debug for Subcategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Subcategory").field("name", &self.name).finish()
    }
}

/// Subcategories in priority order, most specific first.
#[derive(Debug, Clone, Default)]
pub struct Subcategories(Vec<Subcategory>);

impl Subcategories {
    pub fn new() -> Self {
        Subcategories::default()
    }

    /// Append a subcategory with the next lower priority.
    ///
    /// Registering the same name twice is a configuration error.
    pub fn with(mut self, name: &'static str, lookup: LookupFn) -> Result<Self, PolicyError> {
        if self.0.iter().any(|sub| sub.name == name) {
            return Err(PolicyError::InvalidConfiguration(format!(
                "subcategory '{name}' registered more than once"
            )));
        }
        self.0.push(Subcategory { name, lookup });
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subcategory> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Subcategory> for Subcategories {
    fn from_iter<I: IntoIterator<Item = Subcategory>>(iter: I) -> Self {
        Subcategories(iter.into_iter().collect())
    }
}

/// One subcategory of a compiled policy, with the schema it was compiled from.
#[derive(Clone)]
pub struct CompiledRule {
    subcategory: &'static str,
    lookup: LookupFn,
    schema: PolicyNode,
}

impl CompiledRule {
    pub fn subcategory(&self) -> &'static str {
        self.subcategory
    }

    /// `Some` when this subcategory has a definite answer for the object.
    pub fn resolve(
        &self,
        context: &dyn PermissionLookup,
        object_id: &str,
        action: &str,
    ) -> Option<bool> {
        match (self.lookup)(context, &self.schema, object_id)? {
            PolicyNode::Allow => Some(true),
            PolicyNode::Deny => Some(false),
            spec @ PolicyNode::Rules(_) => spec.action(action),
        }
    }
}

impl Debug for CompiledRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CompiledRule")
            .field("subcategory", &self.subcategory)
            .field("schema", &self.schema)
            .finish()
    }
}

/// A compiled category: a pure decision over `(object_id, action)`.
#[derive(Clone)]
pub enum CompiledPolicy {
    AllowAll,
    DenyAll,
    /// First definite answer wins, otherwise deny.
    Ordered {
        rules: Vec<CompiledRule>,
        context: Arc<dyn PermissionLookup>,
    },
}

impl CompiledPolicy {
    pub fn check(&self, object_id: &str, action: &str) -> bool {
        match self {
            CompiledPolicy::AllowAll => true,
            CompiledPolicy::DenyAll => false,
            CompiledPolicy::Ordered { rules, context } => rules
                .iter()
                .find_map(|rule| rule.resolve(context.as_ref(), object_id, action))
                .unwrap_or(false),
        }
    }

    /// Subcategories consulted by this policy, in evaluation order.
    pub fn subcategories(&self) -> Vec<&'static str> {
        match self {
            CompiledPolicy::Ordered { rules, .. } => rules.iter().map(|r| r.subcategory).collect(),
            _ => Vec::new(),
        }
    }
}

impl Debug for CompiledPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CompiledPolicy::AllowAll => f.write_str("AllowAll"),
            CompiledPolicy::DenyAll => f.write_str("DenyAll"),
            CompiledPolicy::Ordered { rules, .. } => {
                f.debug_tuple("Ordered").field(rules).finish()
            }
        }
    }
}

/// Compile one category of a policy into a decision function.
pub fn compile_policy(
    policy: Option<&PolicyNode>,
    subcategories: &Subcategories,
    context: Arc<dyn PermissionLookup>,
) -> CompiledPolicy {
    let schema = match policy {
        None | Some(PolicyNode::Deny) => {
            debug!(event = "Compile", strategy = "DenyAll", reason = "no policy");
            return CompiledPolicy::DenyAll;
        }
        Some(PolicyNode::Allow) => {
            debug!(event = "Compile", strategy = "AllowAll", reason = "category granted");
            return CompiledPolicy::AllowAll;
        }
        Some(PolicyNode::Rules(schema)) => schema,
    };

    let mut rules = Vec::new();
    for sub in subcategories.iter() {
        match schema.get(sub.name) {
            None => {}
            // A boolean subcategory decides every check on its own.
            Some(PolicyNode::Allow) => {
                debug!(event = "Compile", strategy = "AllowAll", subcategory = sub.name);
                return CompiledPolicy::AllowAll;
            }
            Some(PolicyNode::Deny) => {
                debug!(event = "Compile", strategy = "DenyAll", subcategory = sub.name);
                return CompiledPolicy::DenyAll;
            }
            Some(node) => rules.push(CompiledRule {
                subcategory: sub.name,
                lookup: sub.lookup,
                schema: node.clone(),
            }),
        }
    }

    if rules.is_empty() {
        debug!(event = "Compile", strategy = "DenyAll", reason = "no subcategories");
        return CompiledPolicy::DenyAll;
    }

    let names: Vec<&str> = rules.iter().map(|r| r.subcategory).collect();
    debug!(event = "Compile", strategy = "Ordered", subcategories = ?names);
    CompiledPolicy::Ordered { rules, context }
}

/// Whether the `all` subcategory of `policy` grants `action` on everything.
pub fn test_all(policy: Option<&PolicyNode>, action: &str) -> bool {
    match policy {
        None | Some(PolicyNode::Deny) => false,
        Some(PolicyNode::Allow) => true,
        Some(category) => match category.get(EntitySubcategory::All.as_ref()) {
            None | Some(PolicyNode::Deny) => false,
            Some(PolicyNode::Allow) => true,
            Some(all) => all.action(action).unwrap_or(false),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoLookup;
    use serde_json::json;
    use yare::parameterized;

    fn lookup_object_id<'a>(
        _lookup: &dyn PermissionLookup,
        schema: &'a PolicyNode,
        object_id: &str,
    ) -> Option<&'a PolicyNode> {
        schema.get(object_id)
    }

    fn object_subcategories() -> Subcategories {
        Subcategories::new()
            .with("object_ids", lookup_object_id)
            .and_then(|s| s.with("all", lookup_all))
            .unwrap()
    }

    fn compile(value: serde_json::Value) -> CompiledPolicy {
        let node: Option<PolicyNode> = serde_json::from_value(value).unwrap();
        compile_policy(node.as_ref(), &object_subcategories(), Arc::new(NoLookup))
    }

    #[parameterized(
        null = { json!(null) },
        deny = { json!(false) },
        empty = { json!({}) },
        unknown_subcategory = { json!({ "colors": { "blue": true } }) },
    )]
    fn test_deny_all(value: serde_json::Value) {
        let compiled = compile(value);
        assert!(matches!(compiled, CompiledPolicy::DenyAll));
        assert!(!compiled.check("obj-1", "read"));
    }

    #[test]
    fn test_allow_all() {
        let compiled = compile(json!(true));
        assert!(compiled.check("obj-1", "read"));
        assert!(compiled.check("", ""));
    }

    #[parameterized(
        all_true_read = { json!({ "all": true }), "anything", "read", true },
        all_true_edit = { json!({ "all": true }), "other", "edit", true },
        all_read_read = { json!({ "all": { "read": true } }), "anything", "read", true },
        all_read_control = { json!({ "all": { "read": true } }), "anything", "control", false },
        object_read = { json!({ "object_ids": { "obj-1": { "read": true } } }), "obj-1", "read", true },
        object_control = { json!({ "object_ids": { "obj-1": { "read": true } } }), "obj-1", "control", false },
        object_other = { json!({ "object_ids": { "obj-1": { "read": true } } }), "obj-2", "read", false },
        object_true = { json!({ "object_ids": { "obj-1": true } }), "obj-1", "edit", true },
    )]
    fn test_check(value: serde_json::Value, object_id: &str, action: &str, expected: bool) {
        assert_eq!(compile(value).check(object_id, action), expected);
    }

    #[test]
    fn test_specific_subcategory_wins() {
        let compiled = compile(json!({
            "object_ids": { "obj-1": { "read": false } },
            "all": { "read": true, "control": true }
        }));
        assert!(!compiled.check("obj-1", "read"));
        // No opinion from object_ids falls through to all.
        assert!(compiled.check("obj-1", "control"));
        assert!(compiled.check("obj-2", "read"));
        assert_eq!(compiled.subcategories(), vec!["object_ids", "all"]);
    }

    #[test]
    fn test_boolean_subcategory_short_circuits() {
        let compiled = compile(json!({
            "object_ids": { "obj-1": { "read": true } },
            "all": true
        }));
        assert!(matches!(compiled, CompiledPolicy::AllowAll));

        let compiled = compile(json!({
            "object_ids": false,
            "all": true
        }));
        assert!(matches!(compiled, CompiledPolicy::DenyAll));
        assert!(!compiled.check("obj-1", "read"));
    }

    #[test]
    fn test_malformed_leaf_has_no_opinion() {
        let compiled = compile(json!({
            "object_ids": { "obj-1": { "read": { "deep": true } } }
        }));
        assert!(!compiled.check("obj-1", "read"));
    }

    #[test]
    fn test_duplicate_subcategory_rejected() {
        let result = Subcategories::new()
            .with("all", lookup_all)
            .and_then(|s| s.with("all", lookup_all));
        assert!(matches!(result, Err(PolicyError::InvalidConfiguration(_))));
    }

    #[parameterized(
        none = { json!(null), "read", false },
        category_true = { json!(true), "read", true },
        all_true = { json!({ "all": true }), "edit", true },
        all_read = { json!({ "all": { "read": true } }), "read", true },
        all_read_other = { json!({ "all": { "read": true } }), "control", false },
        no_all = { json!({ "domains": { "light": true } }), "read", false },
    )]
    fn test_test_all(value: serde_json::Value, action: &str, expected: bool) {
        let node: Option<PolicyNode> = serde_json::from_value(value).unwrap();
        assert_eq!(test_all(node.as_ref(), action), expected);
    }

    #[test]
    fn test_compiled_debug_lists_rules() {
        let compiled = compile(json!({ "all": { "read": true } }));
        let debug = format!("{compiled:?}");
        assert!(debug.contains("Ordered"));
        assert!(debug.contains("all"));
    }
}
