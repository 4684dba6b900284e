//! Data model types for policy documents, groups and users.
//!
//! Canonical JSON forms:
//! - Policy: `{"entities": <node>}`
//! - Node: `true`, `false`, or a map of keys to nodes
//! - Action map: `{"read": true, "control": true}`

mod group;
mod lookup;
mod names;
mod policy;
mod user;

pub use group::{Group, Groups};
pub use lookup::{NoLookup, RegistryLookup};
pub use names::{Category, EntitySubcategory, PolicyAction};
pub use policy::{Policy, PolicyNode, RuleMap};
pub use user::User;
