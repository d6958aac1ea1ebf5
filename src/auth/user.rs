use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::{Permission, Role};

/// The session principal: who is calling, with which role, from which division.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub division_id: Option<i64>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub division_id: Option<i64>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(user: DbUser) -> Result<Self, Self::Error> {
        let role: Role = user
            .role
            .unwrap_or_default()
            .parse()
            .map_err(|e: anyhow::Error| AppError::Internal(e.to_string()))?;

        Ok(Self {
            id: user.id.unwrap_or_default(),
            name: user.name.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            // Stored rows are checked by the schema, this keeps the principal honest too.
            division_id: if role.has_division() {
                user.division_id
            } else {
                None
            },
            role,
        })
    }
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.id,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(AppError::Authorization(format!(
                "Access denied: {} users cannot do this",
                self.role
            )))
        }
    }

    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.id,
                role = %self.role.as_str(),
                required = %role.as_str(),
                "Role denied"
            );
            Err(AppError::Authorization(format!(
                "Access denied: only {} users allowed",
                role
            )))
        }
    }

    pub fn require_division(&self) -> Result<i64, AppError> {
        self.division_id.ok_or_else(|| {
            tracing::warn!(user_id = %self.id, role = %self.role.as_str(), "No division assigned");
            AppError::Authorization("Access denied: no division assigned".to_string())
        })
    }
}
