use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Warehouse roles recognized by the workflow endpoints.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    WarehouseManager,
    WarehouseStaff,
    Accountant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WarehouseManager => "warehouse_manager",
            Self::WarehouseStaff => "warehouse_staff",
            Self::Accountant => "accountant",
        }
    }
}

/// Role constants used to gate route groups. Comma-separated lists express
/// any-of requirements.
pub mod consts {
    pub const WAREHOUSE_MANAGER: &str = "warehouse_manager";
    pub const WAREHOUSE_STAFF: &str = "warehouse_staff";
    pub const ACCOUNTANT: &str = "accountant";
    pub const WAREHOUSE_ANY: &str = "warehouse_manager, warehouse_staff";
    pub const ALL_ROLES: &str = "warehouse_manager, warehouse_staff, accountant";
}

/// Which list-endpoint filters a caller may use. This only scopes query
/// filters; endpoint authorization is the role middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct FilterAccess {
    pub by_creator: bool,
    pub by_approver: bool,
    pub by_assignee: bool,
}

impl FilterAccess {
    pub const NONE: FilterAccess = FilterAccess {
        by_creator: false,
        by_approver: false,
        by_assignee: false,
    };

    pub const ALL: FilterAccess = FilterAccess {
        by_creator: true,
        by_approver: true,
        by_assignee: true,
    };
}

/// Static lookup from a caller's roles to their filter capability set.
/// The default is fail-closed: an empty or unrecognized role list grants
/// nothing.
pub fn filter_access(roles: &[String]) -> FilterAccess {
    let mut access = FilterAccess::NONE;
    for role in roles {
        match role.parse::<Role>() {
            Ok(Role::WarehouseManager) => access = FilterAccess::ALL,
            Ok(Role::WarehouseStaff) => {
                access.by_creator = true;
                access.by_assignee = true;
            }
            Ok(Role::Accountant) => {
                access.by_approver = true;
            }
            Err(_) => {}
        }
    }
    access
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_role_list_grants_nothing() {
        assert_eq!(filter_access(&[]), FilterAccess::NONE);
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        assert_eq!(
            filter_access(&roles(&["intern", "visitor"])),
            FilterAccess::NONE
        );
    }

    #[test]
    fn manager_gets_everything() {
        assert_eq!(
            filter_access(&roles(&["warehouse_manager"])),
            FilterAccess::ALL
        );
    }

    #[test]
    fn staff_cannot_filter_by_approver() {
        let access = filter_access(&roles(&["warehouse_staff"]));
        assert!(access.by_creator);
        assert!(access.by_assignee);
        assert!(!access.by_approver);
    }

    #[test]
    fn capabilities_accumulate_across_roles() {
        let access = filter_access(&roles(&["warehouse_staff", "accountant"]));
        assert_eq!(access, FilterAccess::ALL);
    }

    #[test]
    fn role_string_round_trip() {
        assert_eq!(
            "warehouse_manager".parse::<Role>().unwrap(),
            Role::WarehouseManager
        );
        assert_eq!(Role::WarehouseStaff.as_str(), "warehouse_staff");
    }
}
