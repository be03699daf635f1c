//! Account entity - A wallet: named money container with a fixed opening balance.
//!
//! `initial_balance` is the only persisted balance. The current balance is always
//! derived from it plus the transaction history (see `core::balance`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::money::Money;

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Display name (e.g., "Cash", "Family savings")
    pub name: String,
    /// Free-text type label such as `"personal"` or `"family"`
    pub account_type: String,
    /// Currency code, upper-case
    pub currency: String,
    /// Signed opening balance
    #[sea_orm(column_type = "Text")]
    pub initial_balance: Money,
    /// Disabled accounts cannot be picked as the current wallet
    pub is_active: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each account belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// One account has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
