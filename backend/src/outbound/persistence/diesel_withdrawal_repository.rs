//! PostgreSQL-backed `WithdrawalRepository`.
//!
//! Recording a withdrawal is the guarded debit followed by the insert in one
//! transaction. A failed guard writes nothing.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{WithdrawalRepository, WithdrawalRepositoryError};
use crate::domain::{NewWithdrawal, UserId, Withdrawal};

use super::balance_ledger;
use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewWithdrawalRow, WithdrawalRow};
use super::pool::{DbPool, PoolError};
use super::schema::withdrawals;

/// Diesel implementation of the withdrawal store.
#[derive(Clone)]
pub struct DieselWithdrawalRepository {
    pool: DbPool,
}

impl DieselWithdrawalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> WithdrawalRepositoryError {
    map_basic_pool_error(error, WithdrawalRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> WithdrawalRepositoryError {
    map_basic_diesel_error(
        error,
        WithdrawalRepositoryError::query,
        WithdrawalRepositoryError::connection,
    )
}

fn decode_row(row: WithdrawalRow) -> Result<Withdrawal, WithdrawalRepositoryError> {
    Withdrawal::try_from(row).map_err(|err| WithdrawalRepositoryError::query(err.to_string()))
}

/// Debit then insert. `Ok(None)` means the balance did not cover the sum.
async fn debit_and_record(
    conn: &mut AsyncPgConnection,
    withdrawal: &NewWithdrawal,
) -> QueryResult<Option<WithdrawalRow>> {
    let debited = balance_ledger::debit(conn, withdrawal.user_id, withdrawal.sum).await?;
    if debited.is_none() {
        return Ok(None);
    }

    let row = NewWithdrawalRow {
        order_number: withdrawal.order.as_ref(),
        user_id: withdrawal.user_id.get(),
        sum: withdrawal.sum.minor_units(),
        processed_at: withdrawal.processed_at,
    };
    diesel::insert_into(withdrawals::table)
        .values(&row)
        .returning(WithdrawalRow::as_returning())
        .get_result(conn)
        .await
        .map(Some)
}

#[async_trait]
impl WithdrawalRepository for DieselWithdrawalRepository {
    async fn create(
        &self,
        withdrawal: &NewWithdrawal,
    ) -> Result<Withdrawal, WithdrawalRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(map_pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        let user_id = withdrawal.user_id;

        let recorded = conn
            .transaction(|conn| {
                async move { debit_and_record(conn, withdrawal).await }.scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?
            .ok_or_else(|| WithdrawalRepositoryError::insufficient_balance(user_id.get()))?;
        decode_row(recorded)
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Withdrawal>, WithdrawalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = withdrawals::table
            .filter(withdrawals::user_id.eq(user_id.get()))
            .order_by((withdrawals::processed_at.asc(), withdrawals::id.asc()))
            .select(WithdrawalRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(decode_row).collect()
    }
}
