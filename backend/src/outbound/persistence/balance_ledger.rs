//! Single-statement balance mutations shared by every ledger writer.
//!
//! Credits and debits are each one SQL statement, so concurrent writers are
//! serialised by PostgreSQL's row lock on `balances`. Callers that need a
//! mutation to commit together with another write run these inside their
//! transaction.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::{Money, UserId};

use super::models::BalanceRow;
use super::schema::balances;

/// Add `amount` to the user's spendable balance, creating the row if needed.
pub(super) async fn credit(
    conn: &mut AsyncPgConnection,
    user_id: UserId,
    amount: Money,
) -> QueryResult<BalanceRow> {
    diesel::insert_into(balances::table)
        .values((
            balances::user_id.eq(user_id.get()),
            balances::current.eq(amount.minor_units()),
            balances::withdrawn.eq(0_i64),
        ))
        .on_conflict(balances::user_id)
        .do_update()
        .set(balances::current.eq(balances::current + amount.minor_units()))
        .returning(BalanceRow::as_returning())
        .get_result(conn)
        .await
}

/// Move `amount` from `current` to `withdrawn` when the balance covers it.
///
/// Returns `None` when the guard fails: either no balance row exists yet or
/// `current` is below `amount`. Nothing is written in that case.
pub(super) async fn debit(
    conn: &mut AsyncPgConnection,
    user_id: UserId,
    amount: Money,
) -> QueryResult<Option<BalanceRow>> {
    diesel::update(
        balances::table
            .filter(balances::user_id.eq(user_id.get()))
            .filter(balances::current.ge(amount.minor_units())),
    )
    .set((
        balances::current.eq(balances::current - amount.minor_units()),
        balances::withdrawn.eq(balances::withdrawn + amount.minor_units()),
    ))
    .returning(BalanceRow::as_returning())
    .get_result(conn)
    .await
    .optional()
}
