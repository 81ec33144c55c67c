//! 도메인 모델.

mod identity;
mod task;
mod user;

pub use identity::VerifiedIdentity;
pub use task::{Task, TaskInput};
pub use user::{Role, UserRecord, ADMIN_ROLE, DEFAULT_USER_ROLE};
