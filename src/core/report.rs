//! Report generation business logic.
//!
//! Loads rows for a user and hands them to the balance projector. All functions return
//! raw decimals and structured data; formatting belongs to whoever presents them.

use crate::{
    core::{
        account::get_account,
        balance::{
            AccountProjection, CategoryShare, MonthWindow, MonthlySummary, category_breakdown,
            project_balance, summarize_month,
        },
        transaction::{TransactionFilter, list_transactions},
    },
    entities::{Category, Transaction, TransactionType, account, category, transaction},
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, prelude::*};
use serde::Serialize;
use std::collections::HashMap;

/// Income and expense totals over a filtered set of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// The filters the totals were computed with
    pub filter: TransactionFilter,
    /// Sum of matching Income amounts
    pub total_income: Decimal,
    /// Sum of matching Expense amounts
    pub total_expense: Decimal,
    /// `total_income - total_expense`
    pub net: Decimal,
    /// Matching rows, transfers included
    pub transaction_count: usize,
}

/// Totals the user's transactions that match `filter`.
///
/// Transfers are counted in `transaction_count` but add to neither total.
pub async fn generate_summary(
    db: &DatabaseConnection,
    user_id: i64,
    filter: TransactionFilter,
) -> Result<Summary> {
    let rows = list_transactions(db, user_id, &filter).await?;

    let total = |kind: TransactionType| -> Decimal {
        rows.iter()
            .filter(|t| t.transaction_type == kind)
            .map(|t| t.amount.get())
            .sum()
    };
    let total_income = total(TransactionType::Income);
    let total_expense = total(TransactionType::Expense);

    Ok(Summary {
        filter,
        total_income,
        total_expense,
        net: total_income - total_expense,
        transaction_count: rows.len(),
    })
}

/// Projects the current balance of one of the user's accounts.
///
/// # Errors
/// Returns `NotFound` if the account does not exist for this user.
pub async fn account_balance(
    db: &DatabaseConnection,
    user_id: i64,
    account_id: i64,
) -> Result<AccountProjection> {
    let account = get_account(db, user_id, account_id).await?;
    let history = account_history(db, user_id, account_id).await?;
    Ok(project_balance(&account, &history))
}

/// A category share with the category's display fields attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdownRow {
    /// The computed share
    #[serde(flatten)]
    pub share: CategoryShare,
    /// Category name
    pub name: String,
    /// Category color, if any
    pub color: Option<String>,
    /// Category icon, if any
    pub icon: Option<String>,
}

/// Everything a one-month account dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyDashboard {
    /// The account shown
    pub account: account::Model,
    /// All-time derived balance
    pub projection: AccountProjection,
    /// Aggregates for the selected month
    pub summary: MonthlySummary,
    /// Expense split by category for the month
    pub expense_breakdown: Vec<CategoryBreakdownRow>,
    /// Income split by category for the month
    pub income_breakdown: Vec<CategoryBreakdownRow>,
}

/// Builds the dashboard for one account and month.
///
/// The balance covers the account's whole history; the summary and breakdowns cover only
/// `window`. `today` decides the daily-average denominator.
///
/// # Errors
/// Returns `NotFound` if the account does not exist for this user.
pub async fn monthly_dashboard(
    db: &DatabaseConnection,
    user_id: i64,
    account_id: i64,
    window: MonthWindow,
    today: NaiveDate,
) -> Result<MonthlyDashboard> {
    let account = get_account(db, user_id, account_id).await?;
    let history = account_history(db, user_id, account_id).await?;

    let projection = project_balance(&account, &history);
    let summary = summarize_month(&history, window, today);

    let categories: HashMap<i64, category::Model> = Category::find()
        .filter(category::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let expense_breakdown = with_names(
        category_breakdown(&history, window, TransactionType::Expense),
        &categories,
    );
    let income_breakdown = with_names(
        category_breakdown(&history, window, TransactionType::Income),
        &categories,
    );

    Ok(MonthlyDashboard {
        account,
        projection,
        summary,
        expense_breakdown,
        income_breakdown,
    })
}

async fn account_history(
    db: &DatabaseConnection,
    user_id: i64,
    account_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::AccountId.eq(account_id))
        .all(db)
        .await
        .map_err(Into::into)
}

fn with_names(
    shares: Vec<CategoryShare>,
    categories: &HashMap<i64, category::Model>,
) -> Vec<CategoryBreakdownRow> {
    shares
        .into_iter()
        .map(|share| {
            let category = categories.get(&share.category_id);
            CategoryBreakdownRow {
                name: category.map_or_else(|| "Unknown".to_string(), |c| c.name.clone()),
                color: category.and_then(|c| c.color.clone()),
                icon: category.and_then(|c| c.icon.clone()),
                share,
            }
        })
        .collect()
}
