//! Diesel table definitions for the ledger schema.
//!
//! These definitions must match `backend/migrations` exactly. Amounts are
//! stored as `BIGINT` minor units, never as floating point.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Int4,
        /// Unique login name.
        login -> Varchar,
        /// Opaque credential hash produced by the authentication layer.
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Submitted purchase orders, keyed by their Luhn-valid number.
    orders (number) {
        number -> Varchar,
        /// Owner; fixed at first submission.
        user_id -> Int4,
        /// One of `NEW`, `PROCESSING`, `INVALID`, `PROCESSED`.
        status -> Varchar,
        /// Credited points in minor units; zero until processed.
        accrual -> Int8,
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user running totals. A row appears with the first credit.
    balances (user_id) {
        user_id -> Int4,
        /// Spendable points; a check constraint keeps it non-negative.
        current -> Int8,
        /// Lifetime withdrawn points.
        withdrawn -> Int8,
    }
}

diesel::table! {
    /// Recorded point spending.
    withdrawals (id) {
        id -> Int4,
        /// Attributed order number. Not a foreign key to `orders`.
        order_number -> Varchar,
        user_id -> Int4,
        sum -> Int8,
        processed_at -> Timestamptz,
    }
}

diesel::joinable!(orders -> users (user_id));
diesel::joinable!(balances -> users (user_id));
diesel::joinable!(withdrawals -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, orders, balances, withdrawals);
