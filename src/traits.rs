use once_cell::sync::OnceCell;

use crate::compile::CompiledPolicy;
use crate::error::PolicyError;

/// Registry data a lookup function may need to resolve a policy key for an
/// entity, e.g. the device an entity belongs to.
///
/// Implementations are expected to be resident in memory; no method may block.
pub trait PermissionLookup: Send + Sync {
    /// The device an entity is attached to.
    fn entity_device(&self, _entity_id: &str) -> Option<String> {
        None
    }

    /// The area an entity is assigned to directly.
    fn entity_area(&self, _entity_id: &str) -> Option<String> {
        None
    }

    /// The area a device is placed in.
    fn device_area(&self, _device_id: &str) -> Option<String> {
        None
    }
}

/// The permission surface used by the rest of the hub.
///
/// The entity decision function is compiled on the first check and reused
/// for the lifetime of the object.
pub trait Permissions: Send + Sync {
    /// Build the entity decision function. Called at most once per instance.
    fn compile_entity_func(&self) -> CompiledPolicy;

    /// Slot holding the compiled entity decision function.
    fn entity_func_cache(&self) -> &OnceCell<CompiledPolicy>;

    /// Whether `action` is granted on every entity, regardless of ID.
    fn access_all_entities(&self, action: &str) -> bool;

    /// Check if `action` is granted on `entity_id`.
    fn check_entity(&self, entity_id: &str, action: &str) -> bool {
        self.entity_func_cache()
            .get_or_init(|| self.compile_entity_func())
            .check(entity_id, action)
    }

    /// Like [`Permissions::check_entity`], but a denial is an error.
    fn require_entity(&self, entity_id: &str, action: &str) -> Result<(), PolicyError> {
        if self.check_entity(entity_id, action) {
            Ok(())
        } else {
            Err(PolicyError::Unauthorized {
                entity_id: entity_id.to_string(),
                action: action.to_string(),
            })
        }
    }

    /// Keep only the entities on which `action` is granted, preserving order.
    fn permitted_entities<'a>(&self, entity_ids: &[&'a str], action: &str) -> Vec<&'a str> {
        entity_ids
            .iter()
            .copied()
            .filter(|entity_id| self.check_entity(entity_id, action))
            .collect()
    }
}
