//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use crate::domain::user::{NewUser, User, UserPatch, UserRepository, UserRole};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{booking, user};

use super::lock_row;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Admin => UserRole::Admin,
        user::UserRole::Customer => UserRole::Customer,
    }
}

fn role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Admin => user::UserRole::Admin,
        UserRole::Customer => user::UserRole::Customer,
    }
}

fn model_to_domain(m: user::Model) -> User {
    User {
        id: m.id,
        name: m.name,
        email: m.email,
        password_hash: m.password_hash,
        phone: m.phone,
        role: role_to_domain(m.role),
    }
}

// ── UserRepository impl ─────────────────────────────────────────

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create(&self, u: NewUser) -> DomainResult<User> {
        let txn = self.db.begin().await?;

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(u.email.as_str()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(DomainError::Conflict("User already exists".into()));
        }

        let model = user::ActiveModel {
            name: Set(u.name),
            email: Set(u.email),
            password_hash: Set(u.password_hash),
            phone: Set(u.phone),
            role: Set(role_to_entity(u.role)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        debug!(user_id = model.id, "User created");
        Ok(model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        let models = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(user::Entity::find().count(&self.db).await?)
    }

    async fn update(&self, id: i32, patch: UserPatch) -> DomainResult<User> {
        let txn = self.db.begin().await?;
        lock_row::<user::Entity>(&txn, user::Column::Id, user::Column::Name, id).await?;

        let Some(existing) = user::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Err(DomainError::not_found("User", id));
        };

        let mut updated = model_to_domain(existing.clone());
        patch.apply_to(&mut updated);

        if updated.email != existing.email {
            let clash = user::Entity::find()
                .filter(user::Column::Email.eq(updated.email.as_str()))
                .filter(user::Column::Id.ne(id))
                .one(&txn)
                .await?;
            if clash.is_some() {
                return Err(DomainError::Conflict("Email already in use".into()));
            }
        }

        let mut active: user::ActiveModel = existing.into();
        active.name = Set(updated.name);
        active.email = Set(updated.email);
        active.phone = Set(updated.phone);
        active.role = Set(role_to_entity(updated.role));
        let model = active.update(&txn).await?;

        txn.commit().await?;
        Ok(model_to_domain(model))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let txn = self.db.begin().await?;
        lock_row::<user::Entity>(&txn, user::Column::Id, user::Column::Name, id).await?;

        if user::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(DomainError::not_found("User", id));
        }

        let active = booking::Entity::find()
            .filter(booking::Column::CustomerId.eq(id))
            .filter(booking::Column::Status.eq(booking::BookingStatus::Active))
            .one(&txn)
            .await?;
        if active.is_some() {
            return Err(DomainError::Conflict(
                "Cannot delete user with active bookings".into(),
            ));
        }

        let purged = booking::Entity::delete_many()
            .filter(booking::Column::CustomerId.eq(id))
            .filter(booking::Column::Status.ne(booking::BookingStatus::Active))
            .exec(&txn)
            .await?;

        user::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        debug!(user_id = id, purged = purged.rows_affected, "User deleted");
        Ok(())
    }
}
