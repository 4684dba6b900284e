//! Policy merging.
//!
//! Policies from several sources (typically one per group a user belongs to)
//! are combined so that the most permissive source wins at every level,
//! independently per key: `true` beats a map, a map beats `false`, and
//! `false` beats an absent key. Maps are merged key by key. The result does
//! not depend on the order of the sources.

use itertools::Itertools;
use tracing::trace;

use crate::types::{Policy, PolicyNode, RuleMap};

/// Merge policy documents into one effective policy.
pub fn merge_policies(policies: &[Policy]) -> Policy {
    let mut merged = RuleMap::new();

    for category in policies
        .iter()
        .flat_map(|policy| policy.categories().keys())
        .unique()
    {
        let sources: Vec<Option<&PolicyNode>> =
            policies.iter().map(|policy| policy.get(category)).collect();
        if let Some(node) = merge_nodes(&sources) {
            merged.insert(category.clone(), node);
        }
    }

    trace!(
        event = "Merge",
        sources = policies.len(),
        categories = merged.len()
    );
    Policy::from(merged)
}

/// Merge the values several sources hold for the same key.
///
/// Returns `None` when no source has an opinion.
pub fn merge_nodes(sources: &[Option<&PolicyNode>]) -> Option<PolicyNode> {
    let present = || sources.iter().flatten();

    if present().any(|node| node.is_allow()) {
        return Some(PolicyNode::Allow);
    }

    let maps: Vec<&RuleMap> = present().filter_map(|node| node.as_rules()).collect();
    if !maps.is_empty() {
        let mut merged = RuleMap::new();
        for key in maps.iter().flat_map(|map| map.keys()).unique() {
            let key_sources: Vec<Option<&PolicyNode>> =
                maps.iter().map(|map| map.get(key)).collect();
            if let Some(node) = merge_nodes(&key_sources) {
                merged.insert(key.clone(), node);
            }
        }
        return Some(PolicyNode::Rules(merged));
    }

    present()
        .any(|node| matches!(node, PolicyNode::Deny))
        .then_some(PolicyNode::Deny)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_json_snapshot;
    use serde_json::json;
    use yare::parameterized;

    fn policy(value: serde_json::Value) -> Policy {
        serde_json::from_value(value).unwrap()
    }

    #[parameterized(
        empty = { json!({}) },
        allow = { json!({ "entities": true }) },
        deny = { json!({ "entities": false }) },
        domains = { json!({ "entities": { "domains": { "light": true } } }) },
        nested = { json!({ "entities": {
            "entity_ids": { "light.kitchen": { "read": true, "control": true } },
            "all": { "read": true }
        } }) },
        several_categories = { json!({ "entities": { "all": true }, "custom": { "x": true } }) },
    )]
    fn test_merge_single_is_identity(value: serde_json::Value) {
        let p = policy(value);
        assert_eq!(merge_policies(std::slice::from_ref(&p)), p);
    }

    #[test]
    fn test_merge_no_policies() {
        assert!(merge_policies(&[]).is_empty());
    }

    #[test]
    fn test_merge_true_wins_over_null() {
        let merged = merge_policies(&[
            policy(json!({ "entities": null })),
            policy(json!({ "entities": true })),
        ]);
        assert_eq!(merged, policy(json!({ "entities": true })));
    }

    #[test]
    fn test_merge_true_absorbs_maps() {
        let merged = merge_policies(&[
            policy(json!({ "entities": { "domains": { "light": { "read": true } } } })),
            policy(json!({ "entities": { "domains": true } })),
        ]);
        assert_eq!(merged, policy(json!({ "entities": { "domains": true } })));
    }

    #[test]
    fn test_merge_domain_union() {
        let merged = merge_policies(&[
            policy(json!({ "entities": { "domains": { "light": true } } })),
            policy(json!({ "entities": { "domains": { "switch": true } } })),
        ]);
        assert_json_snapshot!(merged, @r#"
        {
          "entities": {
            "domains": {
              "light": true,
              "switch": true
            }
          }
        }
        "#);
    }

    #[test]
    fn test_merge_recurses_into_actions() {
        let merged = merge_policies(&[
            policy(json!({ "entities": { "entity_ids": { "light.kitchen": { "read": true } } } })),
            policy(json!({ "entities": {
                "entity_ids": { "light.kitchen": { "control": true } },
                "all": { "read": true }
            } })),
            policy(json!({ "entities": { "entity_ids": { "light.kitchen": false } } })),
        ]);
        assert_json_snapshot!(merged, @r#"
        {
          "entities": {
            "all": {
              "read": true
            },
            "entity_ids": {
              "light.kitchen": {
                "control": true,
                "read": true
              }
            }
          }
        }
        "#);
    }

    #[parameterized(
        false_and_map = { json!({ "entities": false }), json!({ "entities": { "all": true } }), json!({ "entities": { "all": true } }) },
        false_and_true = { json!({ "entities": false }), json!({ "entities": true }), json!({ "entities": true }) },
        false_and_absent = { json!({ "entities": false }), json!({}), json!({ "entities": false }) },
        action_false_and_true = {
            json!({ "entities": { "all": { "read": false } } }),
            json!({ "entities": { "all": { "read": true } } }),
            json!({ "entities": { "all": { "read": true } } })
        },
        disjoint_categories = { json!({ "a": true }), json!({ "b": { "x": true } }), json!({ "a": true, "b": { "x": true } }) },
    )]
    fn test_merge_pair(a: serde_json::Value, b: serde_json::Value, expected: serde_json::Value) {
        let a = policy(a);
        let b = policy(b);
        let expected = policy(expected);
        assert_eq!(merge_policies(&[a.clone(), b.clone()]), expected);
        assert_eq!(merge_policies(&[b, a]), expected);
    }

    #[test]
    fn test_merge_order_independent() {
        let sources = vec![
            policy(json!({ "entities": { "domains": { "light": { "read": true } } } })),
            policy(json!({ "entities": { "domains": { "light": { "control": true }, "lock": false } } })),
            policy(json!({ "entities": { "device_ids": { "dev-1": true } }, "extra": false })),
            policy(json!({ "entities": null, "extra": { "k": true } })),
        ];
        let expected = merge_policies(&sources);

        for permutation in sources.iter().cloned().permutations(sources.len()) {
            assert_eq!(merge_policies(&permutation), expected);
        }
    }

    #[test]
    fn test_merge_is_associative() {
        let a = policy(json!({ "entities": { "domains": { "light": true } } }));
        let b = policy(json!({ "entities": { "domains": { "switch": { "read": true } } } }));
        let c = policy(json!({ "entities": { "domains": { "switch": { "edit": true } } } }));

        let left = merge_policies(&[merge_policies(&[a.clone(), b.clone()]), c.clone()]);
        let right = merge_policies(&[a.clone(), merge_policies(&[b.clone(), c.clone()])]);
        assert_eq!(left, right);
        assert_eq!(left, merge_policies(&[a, b, c]));
    }

    #[parameterized(
        nothing = { vec![None, None], None },
        deny = { vec![None, Some(PolicyNode::Deny)], Some(PolicyNode::Deny) },
        allow = { vec![Some(PolicyNode::Deny), Some(PolicyNode::Allow)], Some(PolicyNode::Allow) },
        empty_rules = { vec![Some(PolicyNode::Rules(RuleMap::new())), Some(PolicyNode::Deny)], Some(PolicyNode::Rules(RuleMap::new())) },
    )]
    fn test_merge_nodes(sources: Vec<Option<PolicyNode>>, expected: Option<PolicyNode>) {
        let refs: Vec<Option<&PolicyNode>> = sources.iter().map(Option::as_ref).collect();
        assert_eq!(merge_nodes(&refs), expected);
    }
}
