//! Balance projection - Pure computations over an account's transaction history.
//!
//! Nothing here touches the database. Balances are never stored; every view re-runs
//! these functions over freshly loaded rows, and identical inputs always produce
//! identical decimal outputs.

use crate::{
    entities::{TransactionType, account, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::Serialize;
use std::collections::HashMap;

/// A single calendar month, the unit of every time-windowed aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MonthWindow {
    year: i32,
    month: u32,
}

impl MonthWindow {
    /// Builds the window for `month` (1-12) of `year`.
    ///
    /// # Errors
    /// Returns `Validation` if `month` is outside 1-12.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::validation(format!(
                "Month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// The window containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month, 1-12
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Whether `timestamp` falls inside this month (UTC).
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp.year() == self.year && timestamp.month() == self.month
    }

    /// Number of days in the month.
    #[must_use]
    pub const fn days_in_month(&self) -> u32 {
        match self.month {
            4 | 6 | 9 | 11 => 30,
            2 if is_leap_year(self.year) => 29,
            2 => 28,
            _ => 31,
        }
    }

    /// Denominator for the daily average.
    ///
    /// The day of the month so far when `today` is inside this window, the full length of
    /// the month otherwise.
    #[must_use]
    pub fn days_elapsed(&self, today: NaiveDate) -> u32 {
        if Self::containing(today) == *self {
            today.day()
        } else {
            self.days_in_month()
        }
    }
}

const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// An account's derived balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountProjection {
    /// The account projected
    pub account_id: i64,
    /// The stored baseline
    pub initial_balance: Decimal,
    /// Sum of Income amounts
    pub total_income: Decimal,
    /// Sum of Expense amounts
    pub total_expense: Decimal,
    /// `initial_balance + total_income - total_expense`
    pub current_balance: Decimal,
    /// Number of the account's rows considered, transfers included
    pub transaction_count: usize,
}

/// Derives the current balance of `account` from its transaction history.
///
/// Rows recorded on other accounts are ignored. Transfer rows are counted but move no
/// money in either direction: a transfer is a single row on the source account and
/// currently affects neither the source nor the destination balance.
#[must_use]
pub fn project_balance(
    account: &account::Model,
    transactions: &[transaction::Model],
) -> AccountProjection {
    let own: Vec<&transaction::Model> = transactions
        .iter()
        .filter(|t| t.account_id == account.id)
        .collect();

    let total_income = sum_of(own.iter().copied(), TransactionType::Income);
    let total_expense = sum_of(own.iter().copied(), TransactionType::Expense);

    let initial_balance = account.initial_balance.get();

    AccountProjection {
        account_id: account.id,
        initial_balance,
        total_income,
        total_expense,
        current_balance: initial_balance + total_income - total_expense,
        transaction_count: own.len(),
    }
}

/// Aggregates for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    /// The month summarised
    pub window: MonthWindow,
    /// Sum of Income amounts in the month
    pub income: Decimal,
    /// Sum of Expense amounts in the month
    pub expense: Decimal,
    /// `income - expense`
    pub net: Decimal,
    /// Rows dated inside the month, transfers included
    pub transaction_count: usize,
    /// Denominator used for `average_daily_expense`
    pub days_elapsed: u32,
    /// `expense / days_elapsed`
    pub average_daily_expense: Decimal,
    /// Share of income kept, as a whole percentage clamped to 0-100
    pub savings_rate: i64,
}

/// Summarises the rows of `transactions` dated inside `window`.
///
/// `today` decides whether the window is the running month (average over days so far)
/// or a closed one (average over the whole month).
#[must_use]
pub fn summarize_month(
    transactions: &[transaction::Model],
    window: MonthWindow,
    today: NaiveDate,
) -> MonthlySummary {
    let in_window: Vec<&transaction::Model> = transactions
        .iter()
        .filter(|t| window.contains(t.trx_date))
        .collect();

    let income = sum_of(in_window.iter().copied(), TransactionType::Income);
    let expense = sum_of(in_window.iter().copied(), TransactionType::Expense);
    let days_elapsed = window.days_elapsed(today);

    MonthlySummary {
        window,
        income,
        expense,
        net: income - expense,
        transaction_count: in_window.len(),
        days_elapsed,
        average_daily_expense: expense / Decimal::from(days_elapsed),
        savings_rate: savings_rate(income, expense),
    }
}

/// `round((income - expense) / income * 100)` clamped to 0-100; 0 when there is no income.
#[must_use]
pub fn savings_rate(income: Decimal, expense: Decimal) -> i64 {
    if income <= Decimal::ZERO {
        return 0;
    }

    let rate = whole_percent(income - expense, income);
    rate.clamp(0, 100)
}

/// One category's slice of a month's income or expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    /// The category grouped on
    pub category_id: i64,
    /// Sum of the category's amounts in the window
    pub total: Decimal,
    /// Rows contributing to `total`
    pub transaction_count: usize,
    /// `total` as a whole percentage of the window's total for the same type
    pub percentage: i64,
}

/// Groups the `kind` rows dated inside `window` by category.
///
/// Shares are ordered by total, largest first, ties by category id. Percentages round
/// half away from zero, so they may not add up to exactly 100. Transfer rows carry no
/// category and always produce an empty breakdown.
#[must_use]
pub fn category_breakdown(
    transactions: &[transaction::Model],
    window: MonthWindow,
    kind: TransactionType,
) -> Vec<CategoryShare> {
    let mut grouped: HashMap<i64, (Decimal, usize)> = HashMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.transaction_type == kind && window.contains(t.trx_date))
    {
        if let Some(category_id) = t.category_id {
            let entry = grouped.entry(category_id).or_insert((Decimal::ZERO, 0));
            entry.0 += t.amount.get();
            entry.1 += 1;
        }
    }

    let window_total: Decimal = grouped.values().map(|(total, _)| *total).sum();

    let mut shares: Vec<CategoryShare> = grouped
        .into_iter()
        .map(|(category_id, (total, transaction_count))| CategoryShare {
            category_id,
            total,
            transaction_count,
            percentage: if window_total.is_zero() {
                0
            } else {
                whole_percent(total, window_total)
            },
        })
        .collect();

    shares.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    shares
}

/// Income, expense and net for one month of a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTotals {
    /// Calendar month, 1-12
    pub month: u32,
    /// Sum of Income amounts
    pub income: Decimal,
    /// Sum of Expense amounts
    pub expense: Decimal,
    /// `income - expense`
    pub net: Decimal,
}

/// Twelve month buckets for `year`, January first. Months without activity are zero.
#[must_use]
pub fn yearly_trend(transactions: &[transaction::Model], year: i32) -> Vec<MonthTotals> {
    (1..=12)
        .map(|month| {
            let window = MonthWindow { year, month };
            let in_month = transactions.iter().filter(|t| window.contains(t.trx_date));
            let income = sum_of(in_month.clone(), TransactionType::Income);
            let expense = sum_of(in_month, TransactionType::Expense);
            MonthTotals {
                month,
                income,
                expense,
                net: income - expense,
            }
        })
        .collect()
}

fn sum_of<'a, I>(transactions: I, kind: TransactionType) -> Decimal
where
    I: Iterator<Item = &'a transaction::Model>,
{
    transactions
        .filter(|t| t.transaction_type == kind)
        .map(|t| t.amount.get())
        .sum()
}

// part / whole * 100, rounded to the nearest integer with halves away from zero.
fn whole_percent(part: Decimal, whole: Decimal) -> i64 {
    (part * Decimal::ONE_HUNDRED / whole)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}
