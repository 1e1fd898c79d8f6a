//! Behaviour tests for order upload, accrual crediting and withdrawals.
//!
//! Scenarios run against the in-memory ledger with a scripted accrual
//! service, driving the same use-case ports an HTTP layer would.

use std::cell::RefCell;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use gophermart::domain::ports::{
    AccrualLookup, OrderRepository, RegistrationRequest, WithdrawalRequest,
};
use gophermart::domain::{
    AccrualReconciliationConfig, AccrualReconciliationPorts, AccrualReconciliationRuntime,
    AccrualReconciliationWorker, Error, ErrorCode, Money, Order, OrderNumber, User, UserId,
    Withdrawal,
};
use gophermart::outbound::memory::InMemoryLedgerStore;
use gophermart::state::{LedgerRepositories, LoyaltyState};
use gophermart::test_support::{MutableClock, NoJitter, RecordingSleeper, ScriptedAccrualSource};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

struct LedgerWorld {
    runtime: Runtime,
    repositories: LedgerRepositories,
    state: LoyaltyState,
    source: Arc<ScriptedAccrualSource>,
    worker: AccrualReconciliationWorker,
    upload: RefCell<Option<Result<Order, Error>>>,
    withdrawal: RefCell<Option<Result<Withdrawal, Error>>>,
    registration: RefCell<Option<Result<User, Error>>>,
}

impl LedgerWorld {
    fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("test runtime");
        let now = Utc
            .with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
            .single()
            .expect("valid time");
        let clock = Arc::new(MutableClock::new(now));
        let repositories = LedgerRepositories::from_store(Arc::new(InMemoryLedgerStore::new()));
        let source = Arc::new(ScriptedAccrualSource::new());
        let worker = AccrualReconciliationWorker::with_runtime(
            AccrualReconciliationPorts::new(repositories.orders.clone(), source.clone()),
            clock.clone(),
            AccrualReconciliationRuntime {
                sleeper: Arc::new(RecordingSleeper::default()),
                jitter: Arc::new(NoJitter),
            },
            AccrualReconciliationConfig::default(),
        );
        let state = LoyaltyState::new(&repositories, clock);

        Self {
            runtime,
            repositories,
            state,
            source,
            worker,
            upload: RefCell::new(None),
            withdrawal: RefCell::new(None),
            registration: RefCell::new(None),
        }
    }

    fn submit(&self, user: i32, number: &str) -> Result<Order, Error> {
        self.runtime
            .block_on(self.state.orders.create_order(UserId::new(user), number))
    }

    fn register(&self, login: &str) -> Result<User, Error> {
        let request = RegistrationRequest {
            login: login.to_owned(),
            password_hash: format!("hash-of-{login}"),
        };
        self.runtime.block_on(self.state.users.register(request))
    }

    fn upload_error_code(&self) -> ErrorCode {
        match self.upload.borrow().as_ref().expect("an upload was attempted") {
            Ok(order) => panic!("expected the upload to be refused, got {order:?}"),
            Err(error) => error.code(),
        }
    }
}

#[fixture]
fn world() -> LedgerWorld {
    LedgerWorld::new()
}

#[given("user {user} has uploaded order {number}")]
fn user_has_uploaded_order(world: &LedgerWorld, user: i32, number: String) {
    world
        .submit(user, &number)
        .expect("initial upload should be accepted");
}

#[given("login {login} has registered")]
fn login_has_registered(world: &LedgerWorld, login: String) {
    world
        .register(&login)
        .expect("first registration should be accepted");
}

#[given("the accrual service reports order {number} processed with {points} points")]
fn accrual_reports_processed(world: &LedgerWorld, number: String, points: String) {
    let accrual = Money::from_str(&points).expect("points parse");
    world
        .source
        .script(&number, vec![Ok(AccrualLookup::Processed { accrual })]);
}

#[given("the accrual service reports order {number} as processing")]
fn accrual_reports_processing(world: &LedgerWorld, number: String) {
    world
        .source
        .script(&number, vec![Ok(AccrualLookup::Processing)]);
}

#[when("the reconciliation loop runs once")]
fn reconciliation_runs_once(world: &LedgerWorld) {
    let shutdown = CancellationToken::new();
    world
        .runtime
        .block_on(world.worker.reconcile_once(&shutdown));
}

#[when("user {user} uploads order {number}")]
fn user_uploads_order(world: &LedgerWorld, user: i32, number: String) {
    let outcome = world.submit(user, &number);
    world.upload.replace(Some(outcome));
}

#[when("login {login} registers again")]
fn login_registers_again(world: &LedgerWorld, login: String) {
    let outcome = world.register(&login);
    world.registration.replace(Some(outcome));
}

#[when("user {user} withdraws {sum} points against order {number}")]
fn user_withdraws(world: &LedgerWorld, user: i32, sum: String, number: String) {
    let request = WithdrawalRequest {
        order: number,
        sum: Money::from_str(&sum).expect("sum parses"),
    };
    let outcome = world
        .runtime
        .block_on(world.state.withdrawals.withdraw(UserId::new(user), request));
    world.withdrawal.replace(Some(outcome));
}

#[then("user {user} has {current} current and {withdrawn} withdrawn points")]
fn user_has_balance(world: &LedgerWorld, user: i32, current: String, withdrawn: String) {
    let balance = world
        .runtime
        .block_on(world.state.balance.get_balance(UserId::new(user)))
        .expect("balance readable");
    assert_eq!(balance.current.to_string(), current);
    assert_eq!(balance.withdrawn.to_string(), withdrawn);
}

#[then("order {number} is {status}")]
fn order_has_status(world: &LedgerWorld, number: String, status: String) {
    let number = OrderNumber::new(number).expect("valid order number");
    let order = world
        .runtime
        .block_on(world.repositories.orders.find_by_number(&number))
        .expect("order lookup")
        .expect("order stored");
    assert_eq!(order.status.as_str(), status);
}

#[then("the withdrawal succeeds")]
fn withdrawal_succeeds(world: &LedgerWorld) {
    let outcome = world.withdrawal.borrow();
    let withdrawal = outcome
        .as_ref()
        .expect("a withdrawal was attempted")
        .as_ref()
        .expect("withdrawal should succeed");
    assert!(withdrawal.sum.is_positive());
}

#[then("the withdrawal is refused for insufficient balance")]
fn withdrawal_refused(world: &LedgerWorld) {
    match world
        .withdrawal
        .borrow()
        .as_ref()
        .expect("a withdrawal was attempted")
    {
        Ok(withdrawal) => panic!("expected a refusal, got {withdrawal:?}"),
        Err(error) => assert_eq!(error.code(), ErrorCode::InsufficientBalance),
    }
}

#[then("the upload is refused because it was already uploaded")]
fn upload_refused_already_uploaded(world: &LedgerWorld) {
    assert_eq!(world.upload_error_code(), ErrorCode::AlreadyUploaded);
}

#[then("the upload is refused because another user owns the order")]
fn upload_refused_owned_by_another(world: &LedgerWorld) {
    assert_eq!(world.upload_error_code(), ErrorCode::OwnedByAnother);
}

#[then("the upload is refused as malformed")]
fn upload_refused_malformed(world: &LedgerWorld) {
    assert_eq!(world.upload_error_code(), ErrorCode::InvalidFormat);
}

#[then("the registration is refused because the login is taken")]
fn registration_refused_login_taken(world: &LedgerWorld) {
    match world
        .registration
        .borrow()
        .as_ref()
        .expect("a registration was attempted")
    {
        Ok(user) => panic!("expected a refusal, got {user:?}"),
        Err(error) => assert_eq!(error.code(), ErrorCode::LoginTaken),
    }
}

#[scenario(
    path = "tests/features/loyalty_ledger.feature",
    name = "Accrued points can be withdrawn until the balance runs out"
)]
fn accrued_points_can_be_withdrawn(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/loyalty_ledger.feature",
    name = "Repeated processed answers credit once"
)]
fn repeated_processed_answers_credit_once(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/loyalty_ledger.feature",
    name = "Orders still being processed stay open"
)]
fn orders_still_being_processed_stay_open(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/loyalty_ledger.feature",
    name = "The same user uploads an order twice"
)]
fn the_same_user_uploads_an_order_twice(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/loyalty_ledger.feature",
    name = "Another user uploads a taken order number"
)]
fn another_user_uploads_a_taken_order_number(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/loyalty_ledger.feature",
    name = "Order numbers failing the checksum are rejected"
)]
fn order_numbers_failing_the_checksum_are_rejected(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/loyalty_ledger.feature",
    name = "A login can only be registered once"
)]
fn a_login_can_only_be_registered_once(world: LedgerWorld) {
    drop(world);
}
