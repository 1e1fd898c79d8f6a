//! In-process ledger store implementing every persistence port.
//!
//! All state sits behind one mutex, so each port call is atomic with respect
//! to every other call. This gives the same guarantees the PostgreSQL
//! adapters get from transactions and guarded updates: a withdrawal debits
//! and records in one step, and an order transition credits at most once.
//! Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    BalanceRepository, BalanceRepositoryError, OrderRepository, OrderRepositoryError,
    TransitionOutcome, UserRepository, UserRepositoryError, WithdrawalRepository,
    WithdrawalRepositoryError,
};
use crate::domain::{
    Balance, BalanceAdjustment, Login, NewUser, NewWithdrawal, Order, OrderNumber, OrderStatus,
    OrderTransition, User, UserId, Withdrawal,
};

#[derive(Default)]
struct LedgerState {
    users: Vec<User>,
    /// Orders in insertion order; `order_index` maps numbers to positions.
    orders: Vec<Order>,
    order_index: HashMap<OrderNumber, usize>,
    balances: HashMap<UserId, Balance>,
    withdrawals: Vec<Withdrawal>,
}

/// Why a balance adjustment was refused.
enum AdjustRefusal {
    Insufficient,
    Overflow,
}

impl LedgerState {
    fn adjust(
        &mut self,
        user_id: UserId,
        adjustment: BalanceAdjustment,
    ) -> Result<Balance, AdjustRefusal> {
        let current = self.balances.get(&user_id).copied().unwrap_or_default();
        let next = current.apply(adjustment).ok_or(match adjustment {
            BalanceAdjustment::Credit(_) => AdjustRefusal::Overflow,
            BalanceAdjustment::Debit(_) => AdjustRefusal::Insufficient,
        })?;
        self.balances.insert(user_id, next);
        Ok(next)
    }

    fn next_id(len: usize) -> Option<i32> {
        i32::try_from(len).ok()?.checked_add(1)
    }
}

/// Ledger store kept in process memory.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<LedgerState>,
}

impl InMemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<E>(
        &self,
        poisoned: impl FnOnce(&'static str) -> E,
    ) -> Result<MutexGuard<'_, LedgerState>, E> {
        self.state
            .lock()
            .map_err(|_| poisoned("ledger state mutex poisoned"))
    }
}

#[async_trait]
impl OrderRepository for InMemoryLedgerStore {
    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let state = self.lock(OrderRepositoryError::query)?;
        Ok(state
            .order_index
            .get(number)
            .and_then(|position| state.orders.get(*position))
            .cloned())
    }

    async fn create(&self, order: &Order) -> Result<(), OrderRepositoryError> {
        let mut state = self.lock(OrderRepositoryError::query)?;
        if state.order_index.contains_key(&order.number) {
            return Err(OrderRepositoryError::duplicate_number(
                order.number.as_ref(),
            ));
        }
        let position = state.orders.len();
        state.orders.push(order.clone());
        state.order_index.insert(order.number.clone(), position);
        Ok(())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderRepositoryError> {
        let state = self.lock(OrderRepositoryError::query)?;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|order| order.uploaded_at);
        Ok(orders)
    }

    async fn list_open(&self) -> Result<Vec<Order>, OrderRepositoryError> {
        let state = self.lock(OrderRepositoryError::query)?;
        Ok(state
            .orders
            .iter()
            .filter(|order| order.status.is_open())
            .cloned()
            .collect())
    }

    async fn update_status_and_credit(
        &self,
        number: &OrderNumber,
        transition: OrderTransition,
    ) -> Result<TransitionOutcome, OrderRepositoryError> {
        let mut state = self.lock(OrderRepositoryError::query)?;
        let Some(position) = state.order_index.get(number).copied() else {
            return Err(OrderRepositoryError::query(format!(
                "order {number} does not exist"
            )));
        };
        let (user_id, status) = match state.orders.get(position) {
            Some(order) => (order.user_id, order.status),
            None => {
                return Err(OrderRepositoryError::query(format!(
                    "order index for {number} is stale"
                )));
            }
        };
        if !status.is_open() {
            return Ok(TransitionOutcome::AlreadySettled);
        }

        // Credit first: a refused credit must leave the order untouched.
        let credit = transition.credit();
        if credit.is_positive() {
            state
                .adjust(user_id, BalanceAdjustment::Credit(credit))
                .map_err(|_| {
                    OrderRepositoryError::query(format!(
                        "crediting {credit} to user {user_id} overflows"
                    ))
                })?;
        }
        if let Some(order) = state.orders.get_mut(position) {
            order.status = transition.target_status();
            if order.status == OrderStatus::Processed {
                order.accrual = credit;
            }
        }
        Ok(TransitionOutcome::Applied)
    }
}

#[async_trait]
impl BalanceRepository for InMemoryLedgerStore {
    async fn find(&self, user_id: UserId) -> Result<Option<Balance>, BalanceRepositoryError> {
        let state = self.lock(BalanceRepositoryError::query)?;
        Ok(state.balances.get(&user_id).copied())
    }

    async fn adjust(
        &self,
        user_id: UserId,
        adjustment: BalanceAdjustment,
    ) -> Result<Balance, BalanceRepositoryError> {
        let mut state = self.lock(BalanceRepositoryError::query)?;
        state
            .adjust(user_id, adjustment)
            .map_err(|refusal| match refusal {
                AdjustRefusal::Insufficient => {
                    BalanceRepositoryError::insufficient_balance(user_id.get())
                }
                AdjustRefusal::Overflow => BalanceRepositoryError::query(format!(
                    "adjusting balance of user {user_id} overflows"
                )),
            })
    }
}

#[async_trait]
impl WithdrawalRepository for InMemoryLedgerStore {
    async fn create(
        &self,
        withdrawal: &NewWithdrawal,
    ) -> Result<Withdrawal, WithdrawalRepositoryError> {
        let mut state = self.lock(WithdrawalRepositoryError::query)?;
        let id = LedgerState::next_id(state.withdrawals.len())
            .ok_or_else(|| WithdrawalRepositoryError::query("withdrawal ids exhausted"))?;
        let user_id = withdrawal.user_id;
        state
            .adjust(user_id, BalanceAdjustment::Debit(withdrawal.sum))
            .map_err(|_| WithdrawalRepositoryError::insufficient_balance(user_id.get()))?;
        let recorded = Withdrawal::from_new(id, withdrawal.clone());
        state.withdrawals.push(recorded.clone());
        Ok(recorded)
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Withdrawal>, WithdrawalRepositoryError> {
        let state = self.lock(WithdrawalRepositoryError::query)?;
        let mut withdrawals: Vec<Withdrawal> = state
            .withdrawals
            .iter()
            .filter(|withdrawal| withdrawal.user_id == user_id)
            .cloned()
            .collect();
        withdrawals.sort_by_key(|withdrawal| withdrawal.processed_at);
        Ok(withdrawals)
    }
}

#[async_trait]
impl UserRepository for InMemoryLedgerStore {
    async fn find_by_login(&self, login: &Login) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock(UserRepositoryError::query)?;
        Ok(state.users.iter().find(|user| &user.login == login).cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut state = self.lock(UserRepositoryError::query)?;
        if state.users.iter().any(|existing| existing.login == user.login) {
            return Err(UserRepositoryError::login_taken(user.login.as_ref()));
        }
        let id = LedgerState::next_id(state.users.len())
            .ok_or_else(|| UserRepositoryError::query("user ids exhausted"))?;
        let created = User {
            id: UserId::new(id),
            login: user.login.clone(),
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
        };
        state.users.push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests;
