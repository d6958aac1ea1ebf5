use anyhow::Error;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ManageUsers,
    ManageDivisions,
    ManageTaxonomy,
    ViewAllAssets,

    ViewAllReports,

    ManageAssets,
    AuthorChecklists,
    AssignChecklists,

    ViewAssignedWork,
    SubmitChecklists,
    ViewOwnReports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superuser,
    Manager,
    Spv,
    Technician,
}

// Role sets are disjoint; a superuser cannot act as a supervisor.
static SUPERUSER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ManageUsers);
    permissions.insert(Permission::ManageDivisions);
    permissions.insert(Permission::ManageTaxonomy);
    permissions.insert(Permission::ViewAllAssets);

    permissions
});

static MANAGER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewAllAssets);
    permissions.insert(Permission::ViewAllReports);

    permissions
});

static SPV_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ManageAssets);
    permissions.insert(Permission::AuthorChecklists);
    permissions.insert(Permission::AssignChecklists);

    permissions
});

static TECHNICIAN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewAssignedWork);
    permissions.insert(Permission::SubmitChecklists);
    permissions.insert(Permission::ViewOwnReports);

    permissions
});

impl Role {
    pub const ALL: [Role; 4] = [Role::Superuser, Role::Manager, Role::Spv, Role::Technician];

    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Superuser => &SUPERUSER_PERMISSIONS,
            Role::Manager => &MANAGER_PERMISSIONS,
            Role::Spv => &SPV_PERMISSIONS,
            Role::Technician => &TECHNICIAN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Only supervisors and technicians belong to a division.
    pub fn has_division(&self) -> bool {
        matches!(self, Role::Spv | Role::Technician)
    }

    /// Where a successful login lands.
    pub fn landing_page(&self) -> &'static str {
        match self {
            Role::Superuser => "/superuser/dashboard",
            Role::Spv => "/spv/dashboard",
            Role::Manager | Role::Technician => "/",
        }
    }

    /// The role's own dashboard, linked from the home page.
    pub fn dashboard_page(&self) -> &'static str {
        match self {
            Role::Superuser => "/superuser/dashboard",
            Role::Manager => "/manager/dashboard",
            Role::Spv => "/spv/dashboard",
            Role::Technician => "/technician/dashboard",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superuser => "superuser",
            Role::Manager => "manager",
            Role::Spv => "spv",
            Role::Technician => "technician",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superuser" => Ok(Role::Superuser),
            "manager" => Ok(Role::Manager),
            "spv" => Ok(Role::Spv),
            "technician" => Ok(Role::Technician),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
