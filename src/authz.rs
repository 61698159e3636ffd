//! Authorization gate over the strict role hierarchy.
//!
//! Each gate is a pure predicate over the principal's role. Satisfaction is
//! monotonic: `Operator > Admin > Member`, so a higher role always passes a
//! lower gate. Denial has no side effects.

use crate::db::schema::{PrincipalRecord, Role};
use crate::error::AuthorizationError;

/// Require at least the given role.
pub fn require(principal: &PrincipalRecord, required: Role) -> Result<(), AuthorizationError> {
    if principal.role >= required {
        Ok(())
    } else {
        Err(AuthorizationError { required })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal_with(role: Role) -> PrincipalRecord {
        PrincipalRecord {
            id: surrealdb::RecordId::from_table_key("principal", "p1"),
            email: "u@example.com".to_string(),
            display_name: None,
            password_hash: String::new(),
            role,
            tenant_id: None,
            is_active: true,
            created_at: None,
            updated_at: None,
            last_seen_at: None,
        }
    }

    #[test]
    fn test_role_satisfies_its_own_gate() {
        for role in [Role::Member, Role::Admin, Role::Operator] {
            assert!(require(&principal_with(role), role).is_ok());
        }
    }

    #[test]
    fn test_higher_role_passes_lower_gate() {
        assert!(require(&principal_with(Role::Operator), Role::Member).is_ok());
        assert!(require(&principal_with(Role::Operator), Role::Admin).is_ok());
        assert!(require(&principal_with(Role::Admin), Role::Member).is_ok());
    }

    #[test]
    fn test_lower_role_denied_at_higher_gate() {
        let err = require(&principal_with(Role::Member), Role::Admin).unwrap_err();
        assert_eq!(err.required, Role::Admin);

        let err = require(&principal_with(Role::Admin), Role::Operator).unwrap_err();
        assert_eq!(err.required, Role::Operator);
    }
}
