//! Request contexts and the role gate.
//!
//! A signed-in caller is represented by a [`SessionContext`]. Role-scoped operations never take
//! the session directly; they take one of the narrow per-role contexts below, which can only be
//! obtained through the exhaustive checks in [`SessionContext::as_admin`] and friends. A caller
//! with the wrong role therefore cannot reach the operation at all.

use crate::entities::{SessionModel, UserRole};
use serde::Serialize;

/// Role together with the scope that role operates in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Identity {
    /// Global approver of principals
    Admin,
    /// Approver and allocator for one college
    Principal {
        /// The principal's college
        college: String,
    },
    /// Hostel operator within one college
    Warden {
        /// The warden's user id
        id: i64,
        /// The warden's college
        college: String,
    },
    /// Applicant within one college
    Student {
        /// The student's user id
        id: i64,
        /// The student's college
        college: String,
    },
}

impl Identity {
    /// Builds an identity from stored role and college; non-admin roles without a college are
    /// unusable and yield `None`.
    #[must_use]
    pub fn from_parts(user_id: i64, role: UserRole, college: Option<String>) -> Option<Self> {
        match (role, college) {
            (UserRole::Admin, _) => Some(Self::Admin),
            (UserRole::Principal, Some(college)) => Some(Self::Principal { college }),
            (UserRole::Warden, Some(college)) => Some(Self::Warden {
                id: user_id,
                college,
            }),
            (UserRole::Student, Some(college)) => Some(Self::Student {
                id: user_id,
                college,
            }),
            (UserRole::Principal | UserRole::Warden | UserRole::Student, None) => None,
        }
    }

    /// The plain role of this identity.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        match self {
            Self::Admin => UserRole::Admin,
            Self::Principal { .. } => UserRole::Principal,
            Self::Warden { .. } => UserRole::Warden,
            Self::Student { .. } => UserRole::Student,
        }
    }
}

/// Everything known about the caller for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    /// Signed-in user id
    pub user_id: i64,
    /// Username at sign-in
    pub username: String,
    /// Role and scope
    pub identity: Identity,
}

/// Proof that the caller is the admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    /// Admin user id
    pub user_id: i64,
}

/// Proof that the caller is a principal, with their college.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    /// Principal user id
    pub user_id: i64,
    /// College the principal governs
    pub college: String,
}

/// Proof that the caller is a warden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardenContext {
    /// Warden user id
    pub warden_id: i64,
    /// Warden's college
    pub college: String,
}

/// Proof that the caller is a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentContext {
    /// Student user id
    pub student_id: i64,
    /// Student's college
    pub college: String,
}

impl SessionContext {
    /// Rebuilds the context from a stored session row.
    #[must_use]
    pub fn from_session(session: SessionModel) -> Option<Self> {
        let identity = Identity::from_parts(session.user_id, session.role, session.college)?;
        Some(Self {
            user_id: session.user_id,
            username: session.username,
            identity,
        })
    }

    /// Admin gate.
    #[must_use]
    pub fn as_admin(&self) -> Option<AdminContext> {
        match &self.identity {
            Identity::Admin => Some(AdminContext {
                user_id: self.user_id,
            }),
            Identity::Principal { .. } | Identity::Warden { .. } | Identity::Student { .. } => None,
        }
    }

    /// Principal gate.
    #[must_use]
    pub fn as_principal(&self) -> Option<PrincipalContext> {
        match &self.identity {
            Identity::Principal { college } => Some(PrincipalContext {
                user_id: self.user_id,
                college: college.clone(),
            }),
            Identity::Admin | Identity::Warden { .. } | Identity::Student { .. } => None,
        }
    }

    /// Warden gate.
    #[must_use]
    pub fn as_warden(&self) -> Option<WardenContext> {
        match &self.identity {
            Identity::Warden { id, college } => Some(WardenContext {
                warden_id: *id,
                college: college.clone(),
            }),
            Identity::Admin | Identity::Principal { .. } | Identity::Student { .. } => None,
        }
    }

    /// Student gate.
    #[must_use]
    pub fn as_student(&self) -> Option<StudentContext> {
        match &self.identity {
            Identity::Student { id, college } => Some(StudentContext {
                student_id: *id,
                college: college.clone(),
            }),
            Identity::Admin | Identity::Principal { .. } | Identity::Warden { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole, college: Option<&str>) -> SessionContext {
        SessionContext {
            user_id: 7,
            username: "someone".to_string(),
            identity: Identity::from_parts(7, role, college.map(ToString::to_string))
                .unwrap_or(Identity::Admin),
        }
    }

    #[test]
    fn test_each_gate_admits_only_its_role() {
        let admin = session(UserRole::Admin, None);
        let principal = session(UserRole::Principal, Some("X"));
        let warden = session(UserRole::Warden, Some("X"));
        let student = session(UserRole::Student, Some("X"));

        assert!(admin.as_admin().is_some());
        assert!(admin.as_principal().is_none());

        assert_eq!(
            principal.as_principal(),
            Some(PrincipalContext {
                user_id: 7,
                college: "X".to_string()
            })
        );
        assert!(principal.as_admin().is_none());
        assert!(principal.as_student().is_none());

        assert_eq!(warden.as_warden().map(|w| w.warden_id), Some(7));
        assert!(warden.as_principal().is_none());

        assert_eq!(student.as_student().map(|s| s.college), Some("X".to_string()));
        assert!(student.as_warden().is_none());
    }

    #[test]
    fn test_collegeless_non_admin_has_no_identity() {
        assert!(Identity::from_parts(1, UserRole::Student, None).is_none());
        assert!(Identity::from_parts(1, UserRole::Principal, None).is_none());
        assert_eq!(
            Identity::from_parts(1, UserRole::Admin, Some("ignored".to_string())),
            Some(Identity::Admin)
        );
    }

    #[test]
    fn test_identity_role_roundtrips_through_parse() {
        for role in [
            UserRole::Admin,
            UserRole::Principal,
            UserRole::Warden,
            UserRole::Student,
        ] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("superuser"), None);
    }
}
