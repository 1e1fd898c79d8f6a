//! Guard and ordering behaviour of the in-memory ledger store.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::Money;

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
        .single()
        .expect("valid time")
}

fn number(raw: &str) -> OrderNumber {
    OrderNumber::new(raw).expect("valid order number")
}

fn points(units: i64) -> Money {
    Money::from_minor_units(units)
}

async fn seed_order(store: &InMemoryLedgerStore, raw: &str, owner: i32, at: DateTime<Utc>) {
    OrderRepository::create(store, &Order::submitted(number(raw), UserId::new(owner), at))
        .await
        .expect("order stored");
}

#[rstest]
#[tokio::test]
async fn duplicate_order_numbers_are_refused(now: DateTime<Utc>) {
    let store = InMemoryLedgerStore::new();
    seed_order(&store, "79927398713", 1, now).await;

    let err = OrderRepository::create(
        &store,
        &Order::submitted(number("79927398713"), UserId::new(2), now),
    )
    .await
    .expect_err("duplicate");

    assert_eq!(err, OrderRepositoryError::duplicate_number("79927398713"));
    let stored = store
        .find_by_number(&number("79927398713"))
        .await
        .expect("lookup")
        .expect("order present");
    assert_eq!(stored.user_id, UserId::new(1));
}

#[rstest]
#[tokio::test]
async fn processed_transition_credits_exactly_once(now: DateTime<Utc>) {
    let store = InMemoryLedgerStore::new();
    seed_order(&store, "79927398713", 1, now).await;
    let transition = OrderTransition::Processed {
        accrual: points(500),
    };

    let first = store
        .update_status_and_credit(&number("79927398713"), transition)
        .await
        .expect("first transition");
    let second = store
        .update_status_and_credit(&number("79927398713"), transition)
        .await
        .expect("second transition");

    assert_eq!(first, TransitionOutcome::Applied);
    assert_eq!(second, TransitionOutcome::AlreadySettled);
    let balance = store
        .find(UserId::new(1))
        .await
        .expect("balance lookup")
        .expect("balance created by credit");
    assert_eq!(balance.current, points(500));
    let order = store
        .find_by_number(&number("79927398713"))
        .await
        .expect("lookup")
        .expect("order present");
    assert_eq!(order.status, OrderStatus::Processed);
    assert_eq!(order.accrual, points(500));
}

#[rstest]
#[tokio::test]
async fn terminal_orders_leave_the_open_set(now: DateTime<Utc>) {
    let store = InMemoryLedgerStore::new();
    seed_order(&store, "79927398713", 1, now).await;
    seed_order(&store, "12345678903", 1, now).await;
    store
        .update_status_and_credit(&number("12345678903"), OrderTransition::Invalid)
        .await
        .expect("invalid transition");
    store
        .update_status_and_credit(&number("79927398713"), OrderTransition::Processing)
        .await
        .expect("processing transition");

    let open = store.list_open().await.expect("open orders");

    assert_eq!(open.len(), 1);
    assert_eq!(open[0].number, number("79927398713"));
    assert_eq!(open[0].status, OrderStatus::Processing);
    assert_eq!(store.find(UserId::new(1)).await.expect("balance"), None);
}

#[rstest]
#[tokio::test]
async fn orders_are_listed_oldest_first(now: DateTime<Utc>) {
    let store = InMemoryLedgerStore::new();
    seed_order(&store, "79927398713", 1, now).await;
    seed_order(&store, "12345678903", 1, now - TimeDelta::hours(1)).await;
    seed_order(&store, "2377225624", 2, now).await;

    let orders = OrderRepository::list_by_user(&store, UserId::new(1))
        .await
        .expect("orders listed");

    let numbers: Vec<&str> = orders.iter().map(|order| order.number.as_ref()).collect();
    assert_eq!(numbers, vec!["12345678903", "79927398713"]);
}

#[rstest]
#[tokio::test]
async fn withdrawal_debits_and_records_atomically(now: DateTime<Utc>) {
    let store = InMemoryLedgerStore::new();
    store
        .adjust(UserId::new(1), BalanceAdjustment::Credit(points(500)))
        .await
        .expect("credit");
    let request = NewWithdrawal {
        order: number("2377225624"),
        user_id: UserId::new(1),
        sum: points(300),
        processed_at: now,
    };

    let recorded = WithdrawalRepository::create(&store, &request)
        .await
        .expect("withdrawal recorded");
    let refused = WithdrawalRepository::create(&store, &request)
        .await
        .expect_err("second withdrawal overdraws");

    assert_eq!(recorded.id, 1);
    assert_eq!(refused, WithdrawalRepositoryError::insufficient_balance(1));
    let balance = store
        .find(UserId::new(1))
        .await
        .expect("balance lookup")
        .expect("balance present");
    assert_eq!(balance.current, points(200));
    assert_eq!(balance.withdrawn, points(300));
    let history = WithdrawalRepository::list_by_user(&store, UserId::new(1))
        .await
        .expect("history");
    assert_eq!(history, vec![recorded]);
}

#[rstest]
#[tokio::test]
async fn debit_without_balance_is_refused() {
    let store = InMemoryLedgerStore::new();

    let err = store
        .adjust(UserId::new(3), BalanceAdjustment::Debit(points(1)))
        .await
        .expect_err("nothing to debit");

    assert_eq!(err, BalanceRepositoryError::insufficient_balance(3));
    assert_eq!(store.find(UserId::new(3)).await.expect("balance"), None);
}

#[rstest]
#[tokio::test]
async fn users_get_sequential_ids_and_unique_logins(now: DateTime<Utc>) {
    let store = InMemoryLedgerStore::new();
    let new_user = |login: &str| NewUser {
        login: Login::new(login).expect("valid login"),
        password_hash: "$argon2id$opaque".to_owned(),
        created_at: now,
    };

    let ada = UserRepository::create(&store, &new_user("ada"))
        .await
        .expect("ada registered");
    let grace = UserRepository::create(&store, &new_user("grace"))
        .await
        .expect("grace registered");
    let clash = UserRepository::create(&store, &new_user("ada"))
        .await
        .expect_err("login taken");

    assert_eq!(ada.id, UserId::new(1));
    assert_eq!(grace.id, UserId::new(2));
    assert_eq!(clash, UserRepositoryError::login_taken("ada"));
    let found = store
        .find_by_login(&Login::new("grace").expect("valid login"))
        .await
        .expect("lookup");
    assert_eq!(found, Some(grace));
}
