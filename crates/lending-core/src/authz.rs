use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::types::UserId;
use crate::LendingResult;

/// Back-office roles. The core never authenticates; it only authorizes
/// against the role carried in the caller context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Agent,
    Analyst,
    Finance,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Agent => "agent",
            Role::Analyst => "analyst",
            Role::Finance => "finance",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Identity and role of the caller, passed explicitly into every gated
/// operation. Never derived from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub user_id: UserId,
    pub role: Role,
}

impl CallerContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Fail with `PermissionDenied` unless the caller holds one of the allowed
/// roles. The action name is surfaced; the role list is not.
pub fn require_role(
    ctx: &CallerContext,
    allowed: &[Role],
    action: &str,
) -> LendingResult<()> {
    if allowed.contains(&ctx.role) {
        Ok(())
    } else {
        Err(LendingError::PermissionDenied {
            action: action.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_role_passes() {
        let ctx = CallerContext::new(7, Role::Analyst);
        assert!(require_role(&ctx, &[Role::Analyst, Role::Admin], "approve").is_ok());
    }

    #[test]
    fn test_disallowed_role_fails() {
        let ctx = CallerContext::new(7, Role::Agent);
        let err = require_role(&ctx, &[Role::Analyst, Role::Admin], "approve").unwrap_err();
        match err {
            LendingError::PermissionDenied { action } => assert_eq!(action, "approve"),
            other => panic!("Expected PermissionDenied, got {other:?}"),
        }
    }
}
