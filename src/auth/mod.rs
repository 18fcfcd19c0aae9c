//! Authentication and access control
//!
//! Handles:
//! - Password hashing
//! - Session tokens
//! - Current-user extractors
//! - Ownership and role policy

mod middleware;
mod password;
pub mod policy;
pub mod session;

pub use middleware::{CurrentUser, MaybeUser};
pub use password::{hash_password, verify_password};
pub use policy::{Owned, Policy, can_access, can_mutate};
pub use session::{Session, create_session_token, verify_session_token};
