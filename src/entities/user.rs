//! User entity - The identity anchor that owns every account, category and transaction.
//!
//! Authentication lives outside the core; this table only carries what the ledger needs
//! to scope its rows. Users are deactivated with `is_active`, never hard-deleted here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user within the application.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum UserRole {
    /// Regular account holder
    #[sea_orm(num_value = 0)]
    User,
    /// Administrator
    #[sea_orm(num_value = 1)]
    Admin,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login email, unique across users
    #[sea_orm(unique)]
    pub email: String,
    /// Optional display name
    pub name: Option<String>,
    /// Soft deactivation flag
    pub is_active: bool,
    /// User or Admin
    pub role: UserRole,
    /// When the user registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many accounts
    #[sea_orm(has_many = "super::account::Entity")]
    Accounts,
    /// One user owns many categories
    #[sea_orm(has_many = "super::category::Entity")]
    Categories,
    /// One user owns many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
