//! Shared test utilities for the wallet ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        account::{self, NewAccount},
        category::{self, NewCategory},
        transaction::{self, TransactionInput},
    },
    entities::{self, CategoryType, TransactionType, UserRole},
    errors::Result,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Inserts a bare active user. No default categories are seeded.
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::user::Model> {
    let user = entities::user::ActiveModel {
        email: Set(email.to_string()),
        name: Set(None),
        is_active: Set(true),
        role: Set(UserRole::User),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(user)
}

/// Creates a root category through the category store.
pub async fn create_test_category(
    db: &DatabaseConnection,
    user_id: i64,
    name: &str,
    category_type: CategoryType,
) -> Result<entities::category::Model> {
    category::create_category(
        db,
        user_id,
        NewCategory {
            name: name.to_string(),
            category_type,
            parent_id: None,
            color: None,
            icon: None,
        },
    )
    .await
}

/// Creates a "personal" account in the default currency.
pub async fn create_test_account(
    db: &DatabaseConnection,
    user_id: i64,
    name: &str,
    initial_balance: Decimal,
) -> Result<entities::account::Model> {
    account::create_account(
        db,
        user_id,
        NewAccount {
            name: name.to_string(),
            account_type: "personal".to_string(),
            currency: None,
            initial_balance,
        },
    )
    .await
}

/// Creates a user with one account holding an initial balance of 1000.
/// Use this when a test only needs somewhere to record transactions.
pub async fn setup_with_account() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::account::Model,
)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "owner@example.com").await?;
    let account = create_test_account(&db, user.id, "Wallet", Decimal::from(1000)).await?;
    Ok((db, user, account))
}

/// Records an Income dated now.
pub async fn create_test_income(
    db: &DatabaseConnection,
    user_id: i64,
    account_id: i64,
    category_id: i64,
    amount: Decimal,
) -> Result<entities::transaction::Model> {
    record(db, user_id, account_id, TransactionType::Income, amount, Some(category_id), None).await
}

/// Records an Expense dated now.
pub async fn create_test_expense(
    db: &DatabaseConnection,
    user_id: i64,
    account_id: i64,
    category_id: i64,
    amount: Decimal,
) -> Result<entities::transaction::Model> {
    record(db, user_id, account_id, TransactionType::Expense, amount, Some(category_id), None).await
}

/// Records a Transfer from `from_account` to `to_account` dated now.
pub async fn create_test_transfer(
    db: &DatabaseConnection,
    user_id: i64,
    from_account: i64,
    to_account: i64,
    amount: Decimal,
) -> Result<entities::transaction::Model> {
    record(db, user_id, from_account, TransactionType::Transfer, amount, None, Some(to_account))
        .await
}

async fn record(
    db: &DatabaseConnection,
    user_id: i64,
    account_id: i64,
    transaction_type: TransactionType,
    amount: Decimal,
    category_id: Option<i64>,
    transfer_account_id: Option<i64>,
) -> Result<entities::transaction::Model> {
    transaction::create_transaction(
        db,
        user_id,
        account_id,
        TransactionInput {
            transaction_type,
            amount,
            trx_date: Utc::now(),
            category_id,
            note: None,
            transfer_account_id,
        },
    )
    .await
}
