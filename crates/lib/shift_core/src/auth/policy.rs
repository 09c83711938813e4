//! Role checks applied after authentication.

use super::AuthError;
use crate::models::user::Role;

pub const MSG_UNAUTHORIZED_ACCESS: &str = "Unauthorized access";

/// Admins and super-admins only.
pub fn authorize_elevated(role: Role) -> Result<(), AuthError> {
    if role.is_elevated() {
        Ok(())
    } else {
        Err(AuthError::Forbidden(MSG_UNAUTHORIZED_ACCESS.into()))
    }
}

/// Whether `actor` may give an account the role `target`.
///
/// Admins may only create or keep plain users; role changes are reserved
/// for super-admins.
pub fn authorize_role_assignment(actor: Role, target: Role) -> Result<(), AuthError> {
    authorize_elevated(actor)?;
    if actor == Role::SuperAdmin || target == Role::User {
        Ok(())
    } else {
        Err(AuthError::Forbidden(
            "Only a super admin can assign elevated roles".into(),
        ))
    }
}

/// Whether `actor` may manage the account of someone holding `subject`.
///
/// Admins cannot act on super-admins.
pub fn authorize_management(actor: Role, subject: Role) -> Result<(), AuthError> {
    authorize_elevated(actor)?;
    if subject == Role::SuperAdmin && actor != Role::SuperAdmin {
        return Err(AuthError::Forbidden(MSG_UNAUTHORIZED_ACCESS.into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_elevated_roles_pass() {
        assert!(authorize_elevated(Role::SuperAdmin).is_ok());
        assert!(authorize_elevated(Role::Admin).is_ok());
        assert!(matches!(
            authorize_elevated(Role::User),
            Err(AuthError::Forbidden(m)) if m == MSG_UNAUTHORIZED_ACCESS
        ));
    }

    #[test]
    fn admins_can_only_assign_user_role() {
        assert!(authorize_role_assignment(Role::Admin, Role::User).is_ok());
        assert!(authorize_role_assignment(Role::Admin, Role::Admin).is_err());
        assert!(authorize_role_assignment(Role::Admin, Role::SuperAdmin).is_err());
        assert!(authorize_role_assignment(Role::SuperAdmin, Role::Admin).is_ok());
        assert!(authorize_role_assignment(Role::User, Role::User).is_err());
    }

    #[test]
    fn admins_cannot_manage_super_admins() {
        assert!(authorize_management(Role::Admin, Role::User).is_ok());
        assert!(authorize_management(Role::Admin, Role::Admin).is_ok());
        assert!(authorize_management(Role::Admin, Role::SuperAdmin).is_err());
        assert!(authorize_management(Role::SuperAdmin, Role::SuperAdmin).is_ok());
    }
}
