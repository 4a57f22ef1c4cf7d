//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod booking_repository;
pub mod repository_provider;
pub mod user_repository;
pub mod vehicle_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter};

/// Take the write lock for row `id` as the first statement of `txn`.
///
/// SQLite opens transactions deferred: two transactions that both read
/// and then write cannot both upgrade, and the second is refused with
/// `SQLITE_BUSY` instead of waiting. A no-op `UPDATE` up front makes the
/// later writer queue on `busy_timeout` and then see the committed state.
/// On Postgres the same statement holds the row lock until commit.
pub(super) async fn lock_row<E>(
    txn: &DatabaseTransaction,
    id_column: E::Column,
    touch: E::Column,
    id: i32,
) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    E::update_many()
        .col_expr(touch, Expr::col(touch).into())
        .filter(id_column.eq(id))
        .exec(txn)
        .await?;
    Ok(())
}
