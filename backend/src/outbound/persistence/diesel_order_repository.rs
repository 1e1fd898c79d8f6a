//! PostgreSQL-backed `OrderRepository`.
//!
//! `update_status_and_credit` is the only multi-statement write: a status
//! update guarded on the order still being open, then the balance credit,
//! both inside one transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{OrderRepository, OrderRepositoryError, TransitionOutcome};
use crate::domain::{Order, OrderNumber, OrderStatus, OrderTransition, UserId};

use super::balance_ledger;
use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::OrderRow;
use super::pool::{DbPool, PoolError};
use super::schema::orders;

/// Diesel implementation of the order store.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrderRepositoryError {
    map_basic_pool_error(error, OrderRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrderRepositoryError {
    map_basic_diesel_error(
        error,
        OrderRepositoryError::query,
        OrderRepositoryError::connection,
    )
}

fn map_insert_error(error: diesel::result::Error, number: &OrderNumber) -> OrderRepositoryError {
    if is_unique_violation(&error) {
        OrderRepositoryError::duplicate_number(number.as_ref())
    } else {
        map_diesel_error(error)
    }
}

fn decode_row(row: OrderRow) -> Result<Order, OrderRepositoryError> {
    Order::try_from(row).map_err(|err| OrderRepositoryError::query(err.to_string()))
}

fn decode_rows(rows: Vec<OrderRow>) -> Result<Vec<Order>, OrderRepositoryError> {
    rows.into_iter().map(decode_row).collect()
}

fn open_statuses() -> [&'static str; 2] {
    OrderStatus::OPEN.map(OrderStatus::as_str)
}

/// Guarded status write plus credit. `Ok(None)` means the order was not open.
async fn apply_transition(
    conn: &mut AsyncPgConnection,
    number: &OrderNumber,
    transition: OrderTransition,
) -> QueryResult<Option<UserId>> {
    let credit = transition.credit();
    let owner = diesel::update(
        orders::table
            .filter(orders::number.eq(number.as_ref()))
            .filter(orders::status.eq_any(open_statuses())),
    )
    .set((
        orders::status.eq(transition.target_status().as_str()),
        orders::accrual.eq(credit.minor_units()),
    ))
    .returning(orders::user_id)
    .get_result::<i32>(conn)
    .await
    .optional()?
    .map(UserId::new);

    if let Some(user_id) = owner.filter(|_| credit.is_positive()) {
        balance_ledger::credit(conn, user_id, credit).await?;
    }
    Ok(owner)
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = orders::table
            .find(number.as_ref())
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(decode_row).transpose()
    }

    async fn create(&self, order: &Order) -> Result<(), OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(orders::table)
            .values(OrderRow::from(order))
            .execute(&mut conn)
            .await
            .map_err(|err| map_insert_error(err, &order.number))?;
        Ok(())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = orders::table
            .filter(orders::user_id.eq(user_id.get()))
            .order_by((orders::uploaded_at.asc(), orders::number.asc()))
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        decode_rows(rows)
    }

    async fn list_open(&self) -> Result<Vec<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = orders::table
            .filter(orders::status.eq_any(open_statuses()))
            .order_by(orders::uploaded_at.asc())
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        decode_rows(rows)
    }

    async fn update_status_and_credit(
        &self,
        number: &OrderNumber,
        transition: OrderTransition,
    ) -> Result<TransitionOutcome, OrderRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(map_pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let owner = conn
            .transaction(|conn| {
                async move { apply_transition(conn, number, transition).await }.scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        if owner.is_some() {
            return Ok(TransitionOutcome::Applied);
        }

        let exists = diesel::select(diesel::dsl::exists(
            orders::table.filter(orders::number.eq(number.as_ref())),
        ))
        .get_result::<bool>(conn)
        .await
        .map_err(map_diesel_error)?;
        if exists {
            debug!(order = %number, "transition skipped: order already settled");
            Ok(TransitionOutcome::AlreadySettled)
        } else {
            Err(OrderRepositoryError::query(format!(
                "order {number} does not exist"
            )))
        }
    }
}
