//! Authenticated identity attached to a request.

use agora_db::entities::user::{self, UserRole};

/// The acting user: an opaque ID and a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User ID.
    pub id: String,
    /// Account role.
    pub role: UserRole,
}

impl Actor {
    /// Create an actor.
    #[must_use]
    pub fn new(id: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Whether the actor holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the actor is the given user.
    #[must_use]
    pub fn is(&self, user_id: &str) -> bool {
        self.id == user_id
    }
}

impl From<&user::Model> for Actor {
    fn from(user: &user::Model) -> Self {
        Self::new(user.id.clone(), user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_roles() {
        let admin = Actor::new("a1", UserRole::Admin);
        let user = Actor::new("u1", UserRole::User);

        assert!(admin.is_admin());
        assert!(!user.is_admin());
        assert!(user.is("u1"));
        assert!(!user.is("a1"));
    }
}
