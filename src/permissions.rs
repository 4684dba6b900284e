//! Permission objects wrapping an effective policy.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::compile::{CompiledPolicy, test_all};
use crate::entities::compile_entities;
use crate::traits::{PermissionLookup, Permissions};
use crate::types::{Category, NoLookup, Policy};

/// Permissions granted by a single (usually merged) policy document.
///
/// The policy is fixed at construction; build a new object to pick up a
/// changed policy.
pub struct PolicyPermissions {
    policy: Policy,
    lookup: Arc<dyn PermissionLookup>,
    entity_func: OnceCell<CompiledPolicy>,
}

impl PolicyPermissions {
    pub fn new(policy: Policy, lookup: Arc<dyn PermissionLookup>) -> Self {
        PolicyPermissions {
            policy,
            lookup,
            entity_func: OnceCell::new(),
        }
    }

    /// Permissions without registry data; device and area rules never match.
    pub fn without_lookup(policy: Policy) -> Self {
        PolicyPermissions::new(policy, Arc::new(NoLookup))
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }
}

impl Permissions for PolicyPermissions {
    fn compile_entity_func(&self) -> CompiledPolicy {
        debug!(event = "Permissions", phase = "Compile", policy = %self.policy);
        compile_entities(
            self.policy.get(Category::Entities.as_ref()),
            Arc::clone(&self.lookup),
        )
    }

    fn entity_func_cache(&self) -> &OnceCell<CompiledPolicy> {
        &self.entity_func
    }

    fn access_all_entities(&self, action: &str) -> bool {
        test_all(self.policy.get(Category::Entities.as_ref()), action)
    }
}

impl PartialEq for PolicyPermissions {
    fn eq(&self, other: &Self) -> bool {
        self.policy == other.policy
    }
}

impl Eq for PolicyPermissions {}

impl Debug for PolicyPermissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PolicyPermissions")
            .field("policy", &self.policy)
            .field("compiled", &self.entity_func.get().is_some())
            .finish()
    }
}

/// Permissions of the owner: everything is allowed.
#[derive(Debug)]
pub struct OwnerPermissions {
    entity_func: OnceCell<CompiledPolicy>,
}

static OWNER_PERMISSIONS: Lazy<OwnerPermissions> = Lazy::new(|| OwnerPermissions {
    entity_func: OnceCell::new(),
});

/// The process-wide owner permissions.
pub fn owner_permissions() -> &'static OwnerPermissions {
    &OWNER_PERMISSIONS
}

impl Permissions for OwnerPermissions {
    fn compile_entity_func(&self) -> CompiledPolicy {
        CompiledPolicy::AllowAll
    }

    fn entity_func_cache(&self) -> &OnceCell<CompiledPolicy> {
        &self.entity_func
    }

    fn access_all_entities(&self, _action: &str) -> bool {
        true
    }
}
