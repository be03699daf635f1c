//! Account (wallet) business logic.
//!
//! Plain CRUD scoped by user. The opening balance may be edited, which shifts every
//! derived balance retroactively; that is accepted behaviour. Deleting an account removes
//! its transactions in the same database transaction.

use crate::{
    entities::{Account, Money, Transaction, account, transaction},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Currency used when none is given.
pub const DEFAULT_CURRENCY: &str = "VND";

const MAX_NAME_LEN: usize = 120;
const MAX_CURRENCY_LEN: usize = 10;

/// Input for [`create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name
    pub name: String,
    /// Free-text type label
    pub account_type: String,
    /// Currency code; defaults to [`DEFAULT_CURRENCY`]
    pub currency: Option<String>,
    /// Opening balance, may be negative
    pub initial_balance: Decimal,
}

/// Input for [`update_account`]. Every field is replaced.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    /// Display name
    pub name: String,
    /// Free-text type label
    pub account_type: String,
    /// Currency code
    pub currency: String,
    /// Active flag; inactive accounts are never chosen as the current account
    pub is_active: bool,
    /// Opening balance
    pub initial_balance: Decimal,
}

/// Lists a user's accounts, newest first.
pub async fn list_accounts(db: &DatabaseConnection, user_id: i64) -> Result<Vec<account::Model>> {
    Account::find()
        .filter(account::Column::UserId.eq(user_id))
        .order_by_desc(account::Column::CreatedAt)
        .order_by_desc(account::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one of the user's accounts by id.
pub async fn get_account(
    db: &DatabaseConnection,
    user_id: i64,
    account_id: i64,
) -> Result<account::Model> {
    find_owned_account(db, user_id, account_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Account",
            id: account_id,
        })
}

/// Creates an active account.
///
/// # Errors
/// Returns `Validation` for an empty or oversized name or currency code, or an initial
/// balance with more than two decimal places or sixteen integer digits.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_account(
    db: &DatabaseConnection,
    user_id: i64,
    input: NewAccount,
) -> Result<account::Model> {
    let name = validate_name(&input.name)?;
    let currency = normalize_currency(input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))?;
    let initial_balance = Money::checked(input.initial_balance, "Initial balance")?;

    let created = account::ActiveModel {
        user_id: Set(user_id),
        name: Set(name),
        account_type: Set(input.account_type.trim().to_string()),
        currency: Set(currency),
        initial_balance: Set(initial_balance),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(account_id = created.id, "Created account");
    Ok(created)
}

/// Replaces an account's editable fields.
///
/// # Errors
/// - `NotFound` if the account does not exist for this user
/// - `Validation` for an empty or oversized name or currency code, or an out-of-range
///   initial balance
#[instrument(skip(db, input))]
pub async fn update_account(
    db: &DatabaseConnection,
    user_id: i64,
    account_id: i64,
    input: AccountUpdate,
) -> Result<account::Model> {
    let name = validate_name(&input.name)?;
    let currency = normalize_currency(&input.currency)?;
    let initial_balance = Money::checked(input.initial_balance, "Initial balance")?;

    let mut active: account::ActiveModel = get_account(db, user_id, account_id).await?.into();
    active.name = Set(name);
    active.account_type = Set(input.account_type.trim().to_string());
    active.currency = Set(currency);
    active.is_active = Set(input.is_active);
    active.initial_balance = Set(initial_balance);

    active.update(db).await.map_err(Into::into)
}

/// Deletes an account and every transaction tied to it.
///
/// That covers the account's own rows and any transfer on the user's other accounts that
/// names it as the destination. Everything happens in one database transaction.
///
/// # Errors
/// Returns `NotFound` if the account does not exist for this user.
#[instrument(skip(db))]
pub async fn delete_account(db: &DatabaseConnection, user_id: i64, account_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = find_owned_account(&txn, user_id, account_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Account",
            id: account_id,
        })?;

    let removed = Transaction::delete_many()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(transaction::Column::AccountId.eq(account_id))
                .add(transaction::Column::TransferAccountId.eq(account_id)),
        )
        .exec(&txn)
        .await?;

    existing.delete(&txn).await?;
    txn.commit().await?;

    info!(
        account_id,
        transactions_removed = removed.rows_affected,
        "Deleted account"
    );
    Ok(())
}

/// Picks the account a user is currently working in.
///
/// The preferred account wins if it is owned and active. Otherwise the newest active
/// account is returned, or `None` when the user has no active account.
pub async fn select_current_account(
    db: &DatabaseConnection,
    user_id: i64,
    preferred: Option<i64>,
) -> Result<Option<account::Model>> {
    if let Some(preferred_id) = preferred {
        if let Some(account) = find_owned_account(db, user_id, preferred_id).await? {
            if account.is_active {
                return Ok(Some(account));
            }
        }
    }

    Account::find()
        .filter(account::Column::UserId.eq(user_id))
        .filter(account::Column::IsActive.eq(true))
        .order_by_desc(account::Column::CreatedAt)
        .order_by_desc(account::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

pub(crate) async fn find_owned_account<C>(
    db: &C,
    user_id: i64,
    account_id: i64,
) -> Result<Option<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find_by_id(account_id)
        .filter(account::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Account name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "Account name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn normalize_currency(currency: &str) -> Result<String> {
    let currency = currency.trim();
    if currency.is_empty() {
        return Err(Error::validation("Currency cannot be empty"));
    }
    if currency.chars().count() > MAX_CURRENCY_LEN {
        return Err(Error::validation(format!(
            "Currency cannot exceed {MAX_CURRENCY_LEN} characters"
        )));
    }
    Ok(currency.to_uppercase())
}
