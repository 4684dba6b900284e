//! Users and their effective permissions.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use utoipa::ToSchema;

use crate::merge::merge_policies;
use crate::permissions::{PolicyPermissions, owner_permissions};
use crate::system_policies::GROUP_ID_ADMIN;
use crate::traits::{PermissionLookup, Permissions};

use super::group::Groups;
use super::lookup::NoLookup;
use super::policy::Policy;

/// A user of the hub with its group memberships.
#[derive(Serialize, ToSchema)]
pub struct User {
    id: String,
    name: String,
    is_owner: bool,
    groups: Groups,
    #[serde(skip)]
    lookup: Arc<dyn PermissionLookup>,
    #[serde(skip)]
    permissions: OnceCell<PolicyPermissions>,
}

impl User {
    /// Create a new user without groups.
    ///
    /// Such a user has no permissions until groups are assigned, unless it is
    /// marked as the owner.
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        User {
            id: id.into(),
            name: name.into(),
            is_owner: false,
            groups: Groups::default(),
            lookup: Arc::new(NoLookup),
            permissions: OnceCell::new(),
        }
    }

    pub fn with_groups(mut self, groups: Groups) -> Self {
        self.groups = groups;
        self.permissions = OnceCell::new();
        self
    }

    pub fn with_owner(mut self, is_owner: bool) -> Self {
        self.is_owner = is_owner;
        self
    }

    /// Registry context used to resolve device and area rules.
    pub fn with_lookup(mut self, lookup: Arc<dyn PermissionLookup>) -> Self {
        self.lookup = lookup;
        self.permissions = OnceCell::new();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    /// Owners and members of the admin group.
    pub fn is_admin(&self) -> bool {
        self.is_owner || self.groups.contains(GROUP_ID_ADMIN)
    }

    /// The merged policy of all groups the user belongs to.
    pub fn effective_policy(&self) -> Policy {
        merge_policies(&self.groups.policies())
    }

    /// The user's permissions, built on first use and kept for the user's lifetime.
    pub fn permissions(&self) -> &dyn Permissions {
        if self.is_owner {
            return owner_permissions();
        }
        self.permissions.get_or_init(|| {
            PolicyPermissions::new(self.effective_policy(), Arc::clone(&self.lookup))
        })
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}", self.id, self.groups)
    }
}

impl Debug for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_owner", &self.is_owner)
            .field("groups", &self.groups)
            .finish()
    }
}
