//! User repository interface

use async_trait::async_trait;

use super::model::{NewUser, User, UserPatch};
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. A duplicate (case-insensitive) email is a `Conflict`.
    async fn create(&self, user: NewUser) -> DomainResult<User>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>>;

    /// Lookup by already-normalized email.
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;

    async fn find_all(&self) -> DomainResult<Vec<User>>;

    async fn count(&self) -> DomainResult<u64>;

    async fn update(&self, id: i32, patch: UserPatch) -> DomainResult<User>;

    /// Delete a user in one transaction: `Conflict` while the user owns an
    /// active booking, otherwise purge their booking history first.
    async fn delete(&self, id: i32) -> DomainResult<()>;
}
