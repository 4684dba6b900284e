//! Entity policy compilation.
//!
//! The `entities` category is resolved through five subcategories, most
//! specific first: explicit entity IDs, devices, areas, domains and finally
//! the blanket `all` rules.

use std::sync::Arc;

use once_cell::sync::Lazy;
use strum::IntoEnumIterator;

use crate::compile::{
    CompiledPolicy, LookupFn, Subcategories, Subcategory, compile_policy, lookup_all,
};
use crate::traits::PermissionLookup;
use crate::types::{EntitySubcategory, PolicyNode};

static ENTITY_SUBCATEGORIES: Lazy<Subcategories> = Lazy::new(|| {
    EntitySubcategory::iter()
        .map(|sub| Subcategory::new(sub.into(), entity_lookup(sub)))
        .collect()
});

fn entity_lookup(sub: EntitySubcategory) -> LookupFn {
    match sub {
        EntitySubcategory::EntityIds => lookup_entity_id,
        EntitySubcategory::DeviceIds => lookup_device_id,
        EntitySubcategory::AreaIds => lookup_area,
        EntitySubcategory::Domains => lookup_domain,
        EntitySubcategory::All => lookup_all,
    }
}

/// The entity subcategories in evaluation order.
pub fn entity_subcategories() -> &'static Subcategories {
    &ENTITY_SUBCATEGORIES
}

/// The domain of an entity ID: everything before the first `.`.
pub fn split_domain(entity_id: &str) -> Option<&str> {
    entity_id.split_once('.').map(|(domain, _)| domain)
}

pub fn lookup_entity_id<'a>(
    _lookup: &dyn PermissionLookup,
    schema: &'a PolicyNode,
    entity_id: &str,
) -> Option<&'a PolicyNode> {
    schema.get(entity_id)
}

pub fn lookup_domain<'a>(
    _lookup: &dyn PermissionLookup,
    schema: &'a PolicyNode,
    entity_id: &str,
) -> Option<&'a PolicyNode> {
    schema.get(split_domain(entity_id)?)
}

pub fn lookup_device_id<'a>(
    lookup: &dyn PermissionLookup,
    schema: &'a PolicyNode,
    entity_id: &str,
) -> Option<&'a PolicyNode> {
    let device_id = lookup.entity_device(entity_id)?;
    schema.get(&device_id)
}

/// An entity's own area takes precedence over the area of its device.
pub fn lookup_area<'a>(
    lookup: &dyn PermissionLookup,
    schema: &'a PolicyNode,
    entity_id: &str,
) -> Option<&'a PolicyNode> {
    let area_id = lookup.entity_area(entity_id).or_else(|| {
        lookup
            .entity_device(entity_id)
            .and_then(|device_id| lookup.device_area(&device_id))
    })?;
    schema.get(&area_id)
}

/// Compile the `entities` category of a policy.
pub fn compile_entities(
    policy: Option<&PolicyNode>,
    lookup: Arc<dyn PermissionLookup>,
) -> CompiledPolicy {
    compile_policy(policy, entity_subcategories(), lookup)
}
