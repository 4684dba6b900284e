//! Groups and group collections.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::policy::Policy;

/// A group of users sharing one policy (e.g. `system-read-only`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Group {
    id: String,
    name: String,
    #[schema(value_type = Object)]
    policy: Policy,
}

impl Group {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N, policy: Policy) -> Self {
        Group {
            id: id.into(),
            name: name.into(),
            policy,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A collection of Group entries.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Groups(Vec<Group>);

impl Groups {
    /// Check if the Groups collection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of groups in this collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.0.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Group> {
        self.0.iter().find(|g| g.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The policies of every group, in membership order.
    pub fn policies(&self) -> Vec<Policy> {
        self.0.iter().map(|g| g.policy.clone()).collect()
    }
}

impl From<Vec<Group>> for Groups {
    fn from(groups: Vec<Group>) -> Self {
        Groups(groups)
    }
}

impl FromIterator<Group> for Groups {
    fn from_iter<I: IntoIterator<Item = Group>>(iter: I) -> Self {
        Groups(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Groups {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for Groups {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let group_ids: Vec<&str> = self.0.iter().map(|g| g.id()).collect();
        write!(f, "[{}]", group_ids.join(", "))
    }
}
