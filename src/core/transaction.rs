//! Transaction business logic - The type-dispatched validator and the transaction store.
//!
//! A write is accepted only after [`validate_transaction`] has checked the proposed values
//! against the account and category tables. Validation finishes before any row is
//! written, so a rejected create or update never partially applies. The account a
//! transaction is recorded on is fixed at creation.

use crate::{
    core::account::find_owned_account,
    entities::{
        Category, CategoryType, Money, Transaction, TransactionType, category, transaction,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Proposed values for a create or an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Income, Expense or Transfer
    pub transaction_type: TransactionType,
    /// Must be strictly positive
    pub amount: Decimal,
    /// When the movement happened
    pub trx_date: DateTime<Utc>,
    /// Required for Income/Expense, must be absent for Transfer
    pub category_id: Option<i64>,
    /// Optional note
    pub note: Option<String>,
    /// Required for Transfer, must be absent otherwise
    pub transfer_account_id: Option<i64>,
}

/// Optional filters for [`list_transactions`] and the report summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Inclusive lower bound on `trx_date`
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `trx_date`
    pub date_to: Option<DateTime<Utc>>,
    /// Only this account
    pub account_id: Option<i64>,
    /// Only this category
    pub category_id: Option<i64>,
    /// Only this type
    pub transaction_type: Option<TransactionType>,
}

/// Checks a proposed transaction against its type's rules.
///
/// | type     | category                        | transfer account                  |
/// |----------|---------------------------------|-----------------------------------|
/// | Income   | required, owned, Income-typed   | forbidden                         |
/// | Expense  | required, owned, Expense-typed  | forbidden                         |
/// | Transfer | forbidden                       | required, owned, not `account_id` |
///
/// The amount must be positive with at most two decimal places and sixteen integer digits,
/// and `account_id` must be one of the user's accounts.
///
/// # Errors
/// Returns `Validation` naming the first rule the input breaks.
pub async fn validate_transaction<C>(
    db: &C,
    user_id: i64,
    account_id: i64,
    input: &TransactionInput,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if input.amount <= Decimal::ZERO {
        return Err(Error::validation("Amount must be greater than 0"));
    }
    Money::checked(input.amount, "Amount")?;

    if find_owned_account(db, user_id, account_id).await?.is_none() {
        return Err(Error::validation("Account does not exist or belongs to another user"));
    }

    match input.transaction_type {
        TransactionType::Income => {
            validate_categorised(db, user_id, input, CategoryType::Income, "Income").await
        }
        TransactionType::Expense => {
            validate_categorised(db, user_id, input, CategoryType::Expense, "Expense").await
        }
        TransactionType::Transfer => {
            let Some(destination) = input.transfer_account_id else {
                return Err(Error::validation("Transfer requires TransferAccountId"));
            };
            if destination == account_id {
                return Err(Error::validation(
                    "Transfer source and destination accounts must differ",
                ));
            }
            if find_owned_account(db, user_id, destination).await?.is_none() {
                return Err(Error::validation(
                    "Transfer destination account does not exist or belongs to another user",
                ));
            }
            if input.category_id.is_some() {
                return Err(Error::validation("Transfer must not have a CategoryId"));
            }
            Ok(())
        }
    }
}

async fn validate_categorised<C>(
    db: &C,
    user_id: i64,
    input: &TransactionInput,
    expected: CategoryType,
    label: &str,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if input.transfer_account_id.is_some() {
        return Err(Error::validation(format!(
            "{label} must not have a TransferAccountId"
        )));
    }

    let Some(category_id) = input.category_id else {
        return Err(Error::validation(format!("{label} requires CategoryId")));
    };

    let category = Category::find_by_id(category_id)
        .filter(category::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            Error::validation("Category does not exist or belongs to another user")
        })?;

    if category.category_type != expected {
        return Err(Error::validation(format!(
            "Category does not belong to {label} type"
        )));
    }

    Ok(())
}

/// Validates and stores a new transaction on `account_id`.
///
/// # Errors
/// Returns `Validation` if any rule of [`validate_transaction`] fails; nothing is written.
#[instrument(skip(db, input), fields(transaction_type = ?input.transaction_type))]
pub async fn create_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    account_id: i64,
    input: TransactionInput,
) -> Result<transaction::Model> {
    let txn = db.begin().await?;

    if let Err(e) = validate_transaction(&txn, user_id, account_id, &input).await {
        debug!(error = %e, "Rejected transaction");
        return Err(e);
    }

    let created = transaction::ActiveModel {
        user_id: Set(user_id),
        account_id: Set(account_id),
        transaction_type: Set(input.transaction_type),
        amount: Set(Money::new(input.amount)),
        trx_date: Set(input.trx_date),
        category_id: Set(input.category_id),
        note: Set(normalize_note(input.note)),
        transfer_account_id: Set(input.transfer_account_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(transaction_id = created.id, "Created transaction");
    Ok(created)
}

/// Re-validates and replaces a transaction's type, amount, date, category, note and
/// transfer account. The account it is recorded on does not change.
///
/// # Errors
/// - `NotFound` if the transaction does not exist for this user
/// - `Validation` if the proposed values break a rule; nothing is written
#[instrument(skip(db, input), fields(transaction_type = ?input.transaction_type))]
pub async fn update_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
    input: TransactionInput,
) -> Result<transaction::Model> {
    let txn = db.begin().await?;

    let existing = find_owned(&txn, user_id, transaction_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Transaction",
            id: transaction_id,
        })?;

    if let Err(e) = validate_transaction(&txn, user_id, existing.account_id, &input).await {
        debug!(error = %e, "Rejected transaction update");
        return Err(e);
    }

    let mut active: transaction::ActiveModel = existing.into();
    active.transaction_type = Set(input.transaction_type);
    active.amount = Set(Money::new(input.amount));
    active.trx_date = Set(input.trx_date);
    active.category_id = Set(input.category_id);
    active.note = Set(normalize_note(input.note));
    active.transfer_account_id = Set(input.transfer_account_id);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Deletes one of the user's transactions.
///
/// # Errors
/// Returns `NotFound` if the transaction does not exist for this user.
#[instrument(skip(db))]
pub async fn delete_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
) -> Result<()> {
    let existing = get_transaction(db, user_id, transaction_id).await?;
    existing.delete(db).await?;
    info!(transaction_id, "Deleted transaction");
    Ok(())
}

/// Finds one of the user's transactions by id.
pub async fn get_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
) -> Result<transaction::Model> {
    find_owned(db, user_id, transaction_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Transaction",
            id: transaction_id,
        })
}

/// Lists the user's transactions matching `filter`, newest `trx_date` first.
///
/// Ties on `trx_date` are broken by id, highest first, so the order is stable across
/// calls for unchanged data.
pub async fn list_transactions(
    db: &DatabaseConnection,
    user_id: i64,
    filter: &TransactionFilter,
) -> Result<Vec<transaction::Model>> {
    let mut query = Transaction::find().filter(transaction::Column::UserId.eq(user_id));

    if let Some(from) = filter.date_from {
        query = query.filter(transaction::Column::TrxDate.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(transaction::Column::TrxDate.lte(to));
    }
    if let Some(account_id) = filter.account_id {
        query = query.filter(transaction::Column::AccountId.eq(account_id));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(transaction::Column::CategoryId.eq(category_id));
    }
    if let Some(transaction_type) = filter.transaction_type {
        query = query.filter(transaction::Column::TransactionType.eq(transaction_type));
    }

    query
        .order_by_desc(transaction::Column::TrxDate)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn find_owned<C>(
    db: &C,
    user_id: i64,
    transaction_id: i64,
) -> Result<Option<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find_by_id(transaction_id)
        .filter(transaction::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
