//! PostgreSQL-backed `BalanceRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{BalanceRepository, BalanceRepositoryError};
use crate::domain::{Balance, BalanceAdjustment, UserId};

use super::balance_ledger;
use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::BalanceRow;
use super::pool::{DbPool, PoolError};
use super::schema::balances;

/// Diesel implementation of the balance store.
#[derive(Clone)]
pub struct DieselBalanceRepository {
    pool: DbPool,
}

impl DieselBalanceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BalanceRepositoryError {
    map_basic_pool_error(error, BalanceRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BalanceRepositoryError {
    map_basic_diesel_error(
        error,
        BalanceRepositoryError::query,
        BalanceRepositoryError::connection,
    )
}

#[async_trait]
impl BalanceRepository for DieselBalanceRepository {
    async fn find(&self, user_id: UserId) -> Result<Option<Balance>, BalanceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = balances::table
            .find(user_id.get())
            .select(BalanceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Balance::from))
    }

    async fn adjust(
        &self,
        user_id: UserId,
        adjustment: BalanceAdjustment,
    ) -> Result<Balance, BalanceRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(map_pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let row = match adjustment {
            BalanceAdjustment::Credit(amount) => balance_ledger::credit(conn, user_id, amount)
                .await
                .map_err(map_diesel_error)?,
            BalanceAdjustment::Debit(amount) => balance_ledger::debit(conn, user_id, amount)
                .await
                .map_err(map_diesel_error)?
                .ok_or_else(|| BalanceRepositoryError::insufficient_balance(user_id.get()))?,
        };
        Ok(Balance::from(row))
    }
}
