//! Transaction entity - A single dated money movement on one account.
//!
//! Direction comes from `transaction_type`, never from the sign of `amount`, which is
//! always positive. A Transfer is one row on the source account with
//! `transfer_account_id` pointing at the destination; no mirror row exists.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::money::Money;

/// Closed set of transaction kinds.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum TransactionType {
    /// Money in, labelled with an Income category
    #[sea_orm(num_value = 0)]
    Income,
    /// Money out, labelled with an Expense category
    #[sea_orm(num_value = 1)]
    Expense,
    /// Movement to another account of the same user
    #[sea_orm(num_value = 2)]
    Transfer,
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Account the transaction is recorded on. Fixed at creation.
    pub account_id: i64,
    /// Income, Expense or Transfer
    pub transaction_type: TransactionType,
    /// Strictly positive amount
    #[sea_orm(column_type = "Text")]
    pub amount: Money,
    /// When the movement happened, distinct from `created_at`
    pub trx_date: DateTimeUtc,
    /// Required for Income/Expense, absent for Transfer
    pub category_id: Option<i64>,
    /// Free-text note
    pub note: Option<String>,
    /// Destination account, present only for Transfer
    pub transfer_account_id: Option<i64>,
    /// When the row was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Each transaction is recorded on one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
    /// Destination account of a transfer
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::TransferAccountId",
        to = "super::account::Column::Id",
        on_delete = "NoAction"
    )]
    TransferAccount,
    /// Category of an income or expense
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "NoAction"
    )]
    Category,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
