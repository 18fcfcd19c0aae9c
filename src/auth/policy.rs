//! Access policy checks
//!
//! Evaluated by services before any mutation. An anonymous actor is
//! always rejected with `Unauthorized`; an authenticated actor that fails
//! the check gets `Forbidden`.

use crate::data::{Comment, Post, Role, User};
use crate::error::AppError;

/// A resource with a single owning user
pub trait Owned {
    fn owner_id(&self) -> &str;
}

impl Owned for Post {
    fn owner_id(&self) -> &str {
        &self.author_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> &str {
        &self.author_id
    }
}

/// Access rule for one operation
#[derive(Debug, Clone, Copy)]
pub enum Policy<'a> {
    /// Any non-anonymous actor
    Authenticated,
    /// Only the resource owner
    Owner(&'a str),
    /// Only actors holding exactly this role
    Role(Role),
}

impl<'a> Policy<'a> {
    /// Ownership rule for `resource`
    pub fn owner_of(resource: &'a impl Owned) -> Self {
        Policy::Owner(resource.owner_id())
    }

    pub fn allows(&self, actor: Option<&User>) -> bool {
        let Some(actor) = actor else {
            return false;
        };
        match self {
            Policy::Authenticated => true,
            Policy::Owner(owner_id) => actor.id == *owner_id,
            Policy::Role(required) => actor.role() == *required,
        }
    }

    /// Check the rule, mapping denial to the matching error
    pub fn enforce(&self, actor: Option<&User>) -> Result<(), AppError> {
        match actor {
            None => Err(AppError::Unauthorized),
            Some(_) if self.allows(actor) => Ok(()),
            Some(user) => {
                tracing::debug!(user_id = %user.id, policy = ?self, "Access denied");
                Err(AppError::Forbidden)
            }
        }
    }
}

/// Whether `actor` may modify or delete `resource`
pub fn can_mutate(actor: Option<&User>, resource: &impl Owned) -> bool {
    Policy::owner_of(resource).allows(actor)
}

/// Whether `user` holds `required`
pub fn can_access(user: &User, required: Role) -> bool {
    Policy::Role(required).allows(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EntityId;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: EntityId::new().0,
            username: format!("user-{}", role.as_str()),
            email: format!("{}@example.com", role.as_str()),
            password_hash: String::new(),
            bio: None,
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        }
    }

    fn post_by(author: &User) -> Post {
        Post {
            id: EntityId::new().0,
            title: "t".to_string(),
            content: "c".to_string(),
            author_id: author.id.clone(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn only_owner_can_mutate() {
        let owner = user(Role::Member);
        let other = user(Role::Admin);
        let post = post_by(&owner);

        assert!(can_mutate(Some(&owner), &post));
        assert!(!can_mutate(Some(&other), &post));
        assert!(!can_mutate(None, &post));
    }

    #[test]
    fn enforce_distinguishes_anonymous_from_denied() {
        let owner = user(Role::Member);
        let other = user(Role::Member);
        let post = post_by(&owner);
        let policy = Policy::owner_of(&post);

        assert!(policy.enforce(Some(&owner)).is_ok());
        assert!(matches!(policy.enforce(Some(&other)), Err(AppError::Forbidden)));
        assert!(matches!(policy.enforce(None), Err(AppError::Unauthorized)));
        assert!(matches!(
            Policy::Authenticated.enforce(None),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn role_access_compares_single_attribute() {
        let librarian = user(Role::Librarian);
        assert!(can_access(&librarian, Role::Librarian));
        assert!(!can_access(&librarian, Role::Admin));
        assert!(!can_access(&librarian, Role::Member));
    }
}
