//! Built-in groups and the policies attached to them.

use once_cell::sync::Lazy;

use crate::types::{Category, EntitySubcategory, Group, Groups, Policy, PolicyAction, PolicyNode};

pub const GROUP_ID_ADMIN: &str = "system-admin";
pub const GROUP_ID_USER: &str = "system-users";
pub const GROUP_ID_READ_ONLY: &str = "system-read-only";

pub static ADMIN_POLICY: Lazy<Policy> =
    Lazy::new(|| Policy::new().with_category(Category::Entities.as_ref(), PolicyNode::Allow));

pub static USER_POLICY: Lazy<Policy> =
    Lazy::new(|| Policy::new().with_category(Category::Entities.as_ref(), PolicyNode::Allow));

pub static READ_ONLY_POLICY: Lazy<Policy> = Lazy::new(|| {
    Policy::new().with_category(
        Category::Entities.as_ref(),
        PolicyNode::rules([(
            EntitySubcategory::All.as_ref(),
            PolicyNode::rules([(PolicyAction::Read.as_ref(), PolicyNode::Allow)]),
        )]),
    )
});

/// The three system groups, each carrying its built-in policy.
pub fn system_groups() -> Groups {
    Groups::from(vec![
        Group::new(GROUP_ID_ADMIN, "Administrators", ADMIN_POLICY.clone()),
        Group::new(GROUP_ID_USER, "Users", USER_POLICY.clone()),
        Group::new(GROUP_ID_READ_ONLY, "Read Only", READ_ONLY_POLICY.clone()),
    ])
}
