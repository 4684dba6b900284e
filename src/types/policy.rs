//! Policy documents.
//!
//! A policy maps category names to [`PolicyNode`]s. Every level of the
//! document shares the same shape: `true` grants everything below it, a map
//! refines access by key, and `false` grants nothing. A `null` or missing key
//! carries no opinion and is dropped when a document is deserialized.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter, Result as FmtResult};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered map of keys (categories, subcategories, object IDs or actions) to nodes.
pub type RuleMap = BTreeMap<String, PolicyNode>;

/// One level of a policy document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyNode {
    /// `true`: everything below this point is granted.
    Allow,
    /// `false`: nothing is granted by this node.
    Deny,
    /// A nested mapping refining access per key.
    Rules(RuleMap),
}

impl PolicyNode {
    /// Build a `Rules` node from key/node pairs.
    pub fn rules<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PolicyNode)>,
        K: Into<String>,
    {
        PolicyNode::Rules(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, PolicyNode::Allow)
    }

    /// The nested mapping, if this node is one.
    pub fn as_rules(&self) -> Option<&RuleMap> {
        match self {
            PolicyNode::Rules(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a child of a `Rules` node. Booleans have no children.
    pub fn get(&self, key: &str) -> Option<&PolicyNode> {
        self.as_rules().and_then(|map| map.get(key))
    }

    /// Resolve `key` in an action mapping such as `{"read": true}`.
    ///
    /// Only boolean leaves are meaningful here; a missing key or a nested map
    /// in action position gives no opinion.
    pub fn action(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            PolicyNode::Allow => Some(true),
            PolicyNode::Deny => Some(false),
            PolicyNode::Rules(_) => None,
        }
    }
}

impl From<bool> for PolicyNode {
    fn from(value: bool) -> Self {
        if value {
            PolicyNode::Allow
        } else {
            PolicyNode::Deny
        }
    }
}

impl Display for PolicyNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl Serialize for PolicyNode {
    fn serialize<S>(&self, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PolicyNode::Allow => ser.serialize_bool(true),
            PolicyNode::Deny => ser.serialize_bool(false),
            PolicyNode::Rules(map) => map.serialize(ser),
        }
    }
}

struct PolicyNodeVisitor;

impl<'de> Visitor<'de> for PolicyNodeVisitor {
    type Value = PolicyNode;

    fn expecting(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("a boolean or a map of policy rules")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(PolicyNode::from(value))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = RuleMap::new();
        while let Some((key, value)) = access.next_entry::<String, Option<PolicyNode>>()? {
            if let Some(value) = value {
                map.insert(key, value);
            }
        }
        Ok(PolicyNode::Rules(map))
    }
}

impl<'de> Deserialize<'de> for PolicyNode {
    fn deserialize<D>(de: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        de.deserialize_any(PolicyNodeVisitor)
    }
}

fn deserialize_rule_map<'de, D>(de: D) -> Result<RuleMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Option<PolicyNode>> = BTreeMap::deserialize(de)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect())
}

/// A complete policy document, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy {
    #[serde(deserialize_with = "deserialize_rule_map")]
    categories: RuleMap,
}

impl Policy {
    pub fn new() -> Self {
        Policy::default()
    }

    /// Add or replace a category.
    pub fn with_category(mut self, category: impl Into<String>, node: PolicyNode) -> Self {
        self.categories.insert(category.into(), node);
        self
    }

    pub fn get(&self, category: &str) -> Option<&PolicyNode> {
        self.categories.get(category)
    }

    pub fn categories(&self) -> &RuleMap {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl From<RuleMap> for Policy {
    fn from(categories: RuleMap) -> Self {
        Policy { categories }
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => Err(fmt::Error),
        }
    }
}
