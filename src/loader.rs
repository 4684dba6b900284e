use std::str::FromStr;

use tracing::debug;

use crate::error::PolicyError;
use crate::types::{Category, EntitySubcategory, Policy, PolicyAction, PolicyNode, RuleMap};

/// Parse a JSON policy document and validate its shape.
///
/// Example:
/// ```rust
/// use homeauth_core::parse_policy;
/// let policy = parse_policy(r#"{"entities": {"domains": {"light": true}}}"#).unwrap();
/// assert!(policy.get("entities").is_some());
/// assert!(parse_policy(r#"{"entities": {"entity_ids": false}}"#).is_err());
/// ```
pub fn parse_policy(text: &str) -> Result<Policy, PolicyError> {
    let policy: Policy = serde_json::from_str(text)?;
    validate_policy(&policy)?;
    Ok(policy)
}

/// Check that a policy only uses shapes the compiler understands.
///
/// `false` is never accepted: a policy grants access, it cannot revoke it.
pub fn validate_policy(policy: &Policy) -> Result<(), PolicyError> {
    let result = policy
        .categories()
        .iter()
        .try_for_each(|(category, node)| match Category::from_str(category) {
            Ok(Category::Entities) => validate_entities(node),
            Err(_) => Err(invalid(category, "unknown category")),
        });

    if let Err(err) = &result {
        debug!(event = "Validate", phase = "Rejected", error = %err);
    }
    result
}

fn validate_entities(node: &PolicyNode) -> Result<(), PolicyError> {
    let path = Category::Entities.as_ref();
    let Some(subcategories) = granted_or_rules(node, path)? else {
        return Ok(());
    };

    for (name, value) in subcategories {
        let path = format!("{path}/{name}");
        let subcategory = EntitySubcategory::from_str(name)
            .map_err(|_| invalid(&path, "unknown subcategory"))?;
        let Some(rules) = granted_or_rules(value, &path)? else {
            continue;
        };
        match subcategory {
            EntitySubcategory::All => validate_actions(rules, &path)?,
            _ => {
                for (key, spec) in rules {
                    let path = format!("{path}/{key}");
                    if let Some(actions) = granted_or_rules(spec, &path)? {
                        validate_actions(actions, &path)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// `Ok(None)` for `true`, the nested rules for a map, an error for `false`.
fn granted_or_rules<'a>(
    node: &'a PolicyNode,
    path: &str,
) -> Result<Option<&'a RuleMap>, PolicyError> {
    match node {
        PolicyNode::Allow => Ok(None),
        PolicyNode::Rules(rules) => Ok(Some(rules)),
        PolicyNode::Deny => Err(invalid(path, "expected true or a map, found false")),
    }
}

fn validate_actions(actions: &RuleMap, path: &str) -> Result<(), PolicyError> {
    for (action, value) in actions {
        let path = format!("{path}/{action}");
        PolicyAction::from_str(action).map_err(|_| invalid(&path, "unknown action"))?;
        if !value.is_allow() {
            return Err(invalid(&path, "expected true"));
        }
    }
    Ok(())
}

fn invalid(path: &str, reason: &str) -> PolicyError {
    PolicyError::InvalidFormat(format!("{reason} at '{path}'"))
}
