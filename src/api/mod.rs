//! API layer
//!
//! HTTP handlers for:
//! - Accounts, profiles and the follow graph
//! - Posts, comments and likes
//! - Feed and notifications
//! - Role-gated views
//! - Book catalog
//! - Metrics (Prometheus)

mod accounts;
mod catalog;
mod dto;
mod extract;
mod feed;
pub mod metrics;
mod posts;
mod roles;

pub use dto::*;

pub use accounts::accounts_router;
pub use catalog::catalog_router;
pub use feed::feed_router;
pub use metrics::{metrics_router, track_http_metrics};
pub use posts::posts_router;
pub use roles::roles_router;
