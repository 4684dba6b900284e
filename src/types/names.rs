//! Category, subcategory and action names used in policy documents.
//!
//! This module centralizes the string keys of the policy language to reduce
//! magic strings throughout the codebase.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Top-level policy categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    /// Access to entities (e.g. `light.kitchen`)
    Entities,
}

/// Subcategories of the `entities` category, most specific first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum EntitySubcategory {
    /// Explicit entity IDs (e.g. `light.kitchen`)
    EntityIds,
    /// Devices, resolved through the device registry
    DeviceIds,
    /// Areas, resolved through the entity and device registries
    AreaIds,
    /// Entity domains (e.g. `light`)
    Domains,
    /// Blanket rules that apply to every entity
    All,
}

/// Actions that can be granted on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PolicyAction {
    Read,
    Control,
    Edit,
}
