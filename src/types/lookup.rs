//! In-memory lookup contexts for policy compilation.

use std::collections::HashMap;

use crate::traits::PermissionLookup;

/// A lookup context with no registry data. Device and area rules never match.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl PermissionLookup for NoLookup {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct EntityEntry {
    device_id: Option<String>,
    area_id: Option<String>,
}

/// Snapshot of the entity and device registries.
#[derive(Debug, Clone, Default)]
pub struct RegistryLookup {
    entities: HashMap<String, EntityEntry>,
    devices: HashMap<String, Option<String>>,
}

impl RegistryLookup {
    pub fn new() -> Self {
        RegistryLookup::default()
    }

    /// Register an entity with its optional device and directly assigned area.
    pub fn with_entity(
        mut self,
        entity_id: impl Into<String>,
        device_id: Option<&str>,
        area_id: Option<&str>,
    ) -> Self {
        self.entities.insert(
            entity_id.into(),
            EntityEntry {
                device_id: device_id.map(str::to_string),
                area_id: area_id.map(str::to_string),
            },
        );
        self
    }

    /// Register a device with its optional area.
    pub fn with_device(mut self, device_id: impl Into<String>, area_id: Option<&str>) -> Self {
        self.devices
            .insert(device_id.into(), area_id.map(str::to_string));
        self
    }
}

impl PermissionLookup for RegistryLookup {
    fn entity_device(&self, entity_id: &str) -> Option<String> {
        self.entities.get(entity_id)?.device_id.clone()
    }

    fn entity_area(&self, entity_id: &str) -> Option<String> {
        self.entities.get(entity_id)?.area_id.clone()
    }

    fn device_area(&self, device_id: &str) -> Option<String> {
        self.devices.get(device_id)?.clone()
    }
}
