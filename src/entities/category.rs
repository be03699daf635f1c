//! Category entity - Per-user income and expense labels organised as a tree.
//!
//! `parent_id` is a self-reference; `None` marks a root. Income and expense categories
//! form disjoint trees because a child must share its parent's `category_type`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a category labels money coming in or going out. Immutable after creation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum CategoryType {
    /// Income category
    #[sea_orm(num_value = 0)]
    Income,
    /// Expense category
    #[sea_orm(num_value = 1)]
    Expense,
}

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Trimmed name, unique per (user, type)
    pub name: String,
    /// Income or Expense
    pub category_type: CategoryType,
    /// Parent category, `None` for a root
    pub parent_id: Option<i64>,
    /// Display color, e.g. `#f59e0b`
    pub color: Option<String>,
    /// Display icon
    pub icon: Option<String>,
    /// Whether the category is offered for new transactions
    pub is_active: bool,
    /// True only for categories seeded at registration
    pub is_default: bool,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each category belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Optional parent category
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "NoAction"
    )]
    Parent,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
