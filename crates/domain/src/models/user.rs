//! User roles and account deletion rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Staff => "staff",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "staff" => Ok(UserRole::Staff),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDeleteUserRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDeleteUserResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeletionDenied {
    #[error("Only admins can delete users")]
    NotAdmin,
    #[error("You cannot delete your own account")]
    SelfDeletion,
}

/// Checks whether `caller` may delete `target`.
pub fn authorize_user_deletion(
    caller: Uuid,
    caller_role: Option<UserRole>,
    target: Uuid,
) -> Result<(), DeletionDenied> {
    if caller_role != Some(UserRole::Admin) {
        return Err(DeletionDenied::NotAdmin);
    }
    if caller == target {
        return Err(DeletionDenied::SelfDeletion);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("staff".parse::<UserRole>().unwrap(), UserRole::Staff);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_admin_may_delete_other_user() {
        let admin = Uuid::new_v4();
        assert!(authorize_user_deletion(admin, Some(UserRole::Admin), Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_non_admin_denied() {
        let caller = Uuid::new_v4();
        assert_eq!(
            authorize_user_deletion(caller, Some(UserRole::Manager), Uuid::new_v4()),
            Err(DeletionDenied::NotAdmin)
        );
        assert_eq!(
            authorize_user_deletion(caller, None, Uuid::new_v4()),
            Err(DeletionDenied::NotAdmin)
        );
    }

    #[test]
    fn test_self_deletion_denied() {
        let admin = Uuid::new_v4();
        assert_eq!(
            authorize_user_deletion(admin, Some(UserRole::Admin), admin),
            Err(DeletionDenied::SelfDeletion)
        );
    }
}
