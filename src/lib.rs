// src/lib.rs
pub use compile::{
    CompiledPolicy, CompiledRule, LookupFn, Subcategories, Subcategory, compile_policy,
    lookup_all, test_all,
};
pub use entities::{
    compile_entities, entity_subcategories, lookup_area, lookup_device_id, lookup_domain,
    lookup_entity_id, split_domain,
};
pub use error::PolicyError;
pub use loader::{parse_policy, validate_policy};
pub use merge::{merge_nodes, merge_policies};
pub use permissions::{OwnerPermissions, PolicyPermissions, owner_permissions};
pub use traits::{PermissionLookup, Permissions};
pub use types::*;

pub mod system_policies;

mod compile;
mod entities;
mod error;
mod loader;
mod merge;
mod permissions;
mod traits;
mod types;
