//! Category business logic - Keeps each user's category tree well formed.
//!
//! Every write runs inside one database transaction and checks, before touching any row:
//! names are unique per (user, type), a parent belongs to the same user and has the same
//! type, and re-parenting never makes a category its own ancestor. Deleting a category
//! lifts its direct children to the root; it never cascades down the subtree.

use crate::{
    entities::{Category, CategoryType, Transaction, category, transaction},
    errors::{Error, Result},
};
use sea_orm::{
    DatabaseTransaction, QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Value},
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

pub(crate) const MAX_NAME_LEN: usize = 120;
pub(crate) const MAX_COLOR_LEN: usize = 16;
pub(crate) const MAX_ICON_LEN: usize = 64;

/// Input for [`create_category`].
#[derive(Debug, Clone)]
pub struct NewCategory {
    /// Name, trimmed before use
    pub name: String,
    /// Income or Expense, fixed for the life of the category
    pub category_type: CategoryType,
    /// Parent id; `None` or `Some(0)` means root
    pub parent_id: Option<i64>,
    /// Display color
    pub color: Option<String>,
    /// Display icon
    pub icon: Option<String>,
}

/// Input for [`update_category`]. Replaces name, active flag, parent, color and icon.
#[derive(Debug, Clone)]
pub struct CategoryUpdate {
    /// New name, trimmed before use
    pub name: String,
    /// New active flag
    pub is_active: bool,
    /// New parent id; `None` or `Some(0)` detaches to root
    pub parent_id: Option<i64>,
    /// New display color
    pub color: Option<String>,
    /// New display icon
    pub icon: Option<String>,
    /// Accepted only when equal to the stored type
    pub category_type: Option<CategoryType>,
}

/// Lists a user's categories ordered by type (Income first) then name.
pub async fn list_categories(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<category::Model>> {
    Category::find()
        .filter(category::Column::UserId.eq(user_id))
        .order_by_asc(category::Column::CategoryType)
        .order_by_asc(category::Column::Name)
        .order_by_asc(category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one of the user's categories by id.
pub async fn get_category(
    db: &DatabaseConnection,
    user_id: i64,
    category_id: i64,
) -> Result<category::Model> {
    find_owned(db, user_id, category_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Category",
            id: category_id,
        })
}

/// Creates a category for `user_id`.
///
/// # Errors
/// - `Validation` for an empty or oversized name, color or icon, a parent that is missing
///   or owned by someone else, or a parent of the other type
/// - `Conflict` if the user already has a category of this type with the same name
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_category(
    db: &DatabaseConnection,
    user_id: i64,
    input: NewCategory,
) -> Result<category::Model> {
    let name = validate_name(&input.name)?;
    validate_style(input.color.as_deref(), input.icon.as_deref())?;

    let txn = db.begin().await?;

    if name_taken(&txn, user_id, input.category_type, &name, None).await? {
        return Err(duplicate_name());
    }

    let parent_id = normalize_parent_id(input.parent_id);
    if let Some(parent_id) = parent_id {
        let parent = find_owned(&txn, user_id, parent_id)
            .await?
            .ok_or_else(parent_not_found)?;
        if parent.category_type != input.category_type {
            return Err(parent_type_mismatch());
        }
    }

    let created = category::ActiveModel {
        user_id: Set(user_id),
        name: Set(name),
        category_type: Set(input.category_type),
        parent_id: Set(parent_id),
        color: Set(input.color),
        icon: Set(input.icon),
        is_active: Set(true),
        is_default: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(category_id = created.id, "Created category");
    Ok(created)
}

/// Updates a category in place. The type can never change.
///
/// # Errors
/// - `NotFound` if the category does not exist for this user
/// - `Validation` for a type change, a bad name/color/icon, a self-parent, an invalid
///   parent, or a parent that is currently a descendant of this category
/// - `Conflict` if another category of the same type already has the name
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn update_category(
    db: &DatabaseConnection,
    user_id: i64,
    category_id: i64,
    input: CategoryUpdate,
) -> Result<category::Model> {
    let txn = db.begin().await?;

    let existing = find_owned(&txn, user_id, category_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Category",
            id: category_id,
        })?;

    if input
        .category_type
        .is_some_and(|requested| requested != existing.category_type)
    {
        return Err(Error::validation("Changing a category's type is not supported"));
    }

    let name = validate_name(&input.name)?;
    validate_style(input.color.as_deref(), input.icon.as_deref())?;

    if name_taken(
        &txn,
        user_id,
        existing.category_type,
        &name,
        Some(category_id),
    )
    .await?
    {
        return Err(duplicate_name());
    }

    let parent_id = normalize_parent_id(input.parent_id);
    if let Some(parent_id) = parent_id {
        if parent_id == category_id {
            return Err(Error::validation("A category cannot be its own parent"));
        }

        let parent = find_owned(&txn, user_id, parent_id)
            .await?
            .ok_or_else(parent_not_found)?;
        if parent.category_type != existing.category_type {
            return Err(parent_type_mismatch());
        }

        let parents = parent_map(&txn, user_id).await?;
        if would_create_cycle(&parents, category_id, parent_id) {
            debug!(category_id, parent_id, "Rejected re-parenting that forms a cycle");
            return Err(Error::validation(
                "Invalid parent: the category would become its own ancestor",
            ));
        }
    }

    let mut active: category::ActiveModel = existing.into();
    active.name = Set(name);
    active.is_active = Set(input.is_active);
    active.parent_id = Set(parent_id);
    active.color = Set(input.color);
    active.icon = Set(input.icon);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Deletes a category after re-parenting its direct children to the root.
///
/// Grandchildren keep their parent. A category still used by transactions is not
/// deleted, since income and expense rows must always keep their category.
///
/// # Errors
/// - `NotFound` if the category does not exist for this user
/// - `Conflict` if transactions still reference it
#[instrument(skip(db))]
pub async fn delete_category(db: &DatabaseConnection, user_id: i64, category_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = find_owned(&txn, user_id, category_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Category",
            id: category_id,
        })?;

    let in_use = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::CategoryId.eq(category_id))
        .count(&txn)
        .await?;
    if in_use > 0 {
        return Err(Error::conflict(format!(
            "Category is used by {in_use} transaction(s)"
        )));
    }

    let lifted = Category::update_many()
        .col_expr(category::Column::ParentId, Expr::value(Value::BigInt(None)))
        .filter(category::Column::UserId.eq(user_id))
        .filter(category::Column::ParentId.eq(category_id))
        .exec(&txn)
        .await?;

    existing.delete(&txn).await?;
    txn.commit().await?;

    info!(
        category_id,
        children_lifted = lifted.rows_affected,
        "Deleted category"
    );
    Ok(())
}

/// Treats the sentinel parent id `0` as "no parent".
#[must_use]
pub const fn normalize_parent_id(parent_id: Option<i64>) -> Option<i64> {
    match parent_id {
        Some(0) => None,
        other => other,
    }
}

/// Returns true if making `candidate_parent` the parent of `category_id` would close a loop.
///
/// Walks upward from the candidate through `parents` (child id -> parent id). Reaching
/// `category_id` means the candidate is already one of its descendants. Each node is
/// visited at most once, so a pre-existing loop elsewhere cannot hang the walk.
#[must_use]
pub fn would_create_cycle(
    parents: &HashMap<i64, Option<i64>>,
    category_id: i64,
    candidate_parent: i64,
) -> bool {
    let mut visited = HashSet::new();
    let mut current = Some(candidate_parent);

    while let Some(node) = current {
        if node == category_id {
            return true;
        }
        if !visited.insert(node) {
            return false;
        }
        current = parents.get(&node).copied().flatten();
    }

    false
}

async fn find_owned<C>(db: &C, user_id: i64, category_id: i64) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .filter(category::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn name_taken(
    txn: &DatabaseTransaction,
    user_id: i64,
    category_type: CategoryType,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let mut query = Category::find()
        .filter(category::Column::UserId.eq(user_id))
        .filter(category::Column::CategoryType.eq(category_type))
        .filter(category::Column::Name.eq(name));
    if let Some(id) = exclude_id {
        query = query.filter(category::Column::Id.ne(id));
    }
    Ok(query.count(txn).await? > 0)
}

async fn parent_map(txn: &DatabaseTransaction, user_id: i64) -> Result<HashMap<i64, Option<i64>>> {
    let categories = Category::find()
        .filter(category::Column::UserId.eq(user_id))
        .all(txn)
        .await?;
    Ok(categories.into_iter().map(|c| (c.id, c.parent_id)).collect())
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "Category name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_style(color: Option<&str>, icon: Option<&str>) -> Result<()> {
    if color.is_some_and(|c| c.chars().count() > MAX_COLOR_LEN) {
        return Err(Error::validation(format!(
            "Category color cannot exceed {MAX_COLOR_LEN} characters"
        )));
    }
    if icon.is_some_and(|i| i.chars().count() > MAX_ICON_LEN) {
        return Err(Error::validation(format!(
            "Category icon cannot exceed {MAX_ICON_LEN} characters"
        )));
    }
    Ok(())
}

fn duplicate_name() -> Error {
    Error::conflict("A category with this name already exists for this type")
}

fn parent_not_found() -> Error {
    Error::validation("Parent category does not exist or belongs to another user")
}

fn parent_type_mismatch() -> Error {
    Error::validation("A child category must have the same type as its parent")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn new_category(name: &str, category_type: CategoryType, parent_id: Option<i64>) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            category_type,
            parent_id,
            color: None,
            icon: None,
        }
    }

    fn reparent(model: &category::Model, parent_id: Option<i64>) -> CategoryUpdate {
        CategoryUpdate {
            name: model.name.clone(),
            is_active: model.is_active,
            parent_id,
            color: model.color.clone(),
            icon: model.icon.clone(),
            category_type: None,
        }
    }

    #[test]
    fn test_normalize_parent_id() {
        assert_eq!(normalize_parent_id(Some(0)), None);
        assert_eq!(normalize_parent_id(None), None);
        assert_eq!(normalize_parent_id(Some(5)), Some(5));
    }

    #[test]
    fn test_would_create_cycle() {
        // 1 is root, 2 under 1, 3 under 2, 4 is an unrelated root
        let parents = HashMap::from([(1, None), (2, Some(1)), (3, Some(2)), (4, None)]);

        assert!(would_create_cycle(&parents, 1, 3));
        assert!(would_create_cycle(&parents, 1, 2));
        assert!(!would_create_cycle(&parents, 1, 4));
        assert!(!would_create_cycle(&parents, 3, 1));
    }

    #[test]
    fn test_would_create_cycle_terminates_on_existing_loop() {
        let parents = HashMap::from([(1, Some(2)), (2, Some(1)), (3, None)]);
        assert!(!would_create_cycle(&parents, 3, 1));
    }

    #[tokio::test]
    async fn test_create_category_trims_and_defaults() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;

        let created = create_category(
            &db,
            user.id,
            NewCategory {
                name: "  Groceries  ".to_string(),
                category_type: CategoryType::Expense,
                parent_id: Some(0),
                color: Some("#f59e0b".to_string()),
                icon: None,
            },
        )
        .await?;

        assert_eq!(created.name, "Groceries");
        assert_eq!(created.parent_id, None);
        assert!(created.is_active);
        assert!(!created.is_default);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_category_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;

        let result =
            create_category(&db, user.id, new_category("   ", CategoryType::Income, None)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let long_name = "x".repeat(121);
        let result = create_category(
            &db,
            user.id,
            new_category(&long_name, CategoryType::Income, None),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_category(
            &db,
            user.id,
            new_category("Orphan", CategoryType::Income, Some(999)),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_name_same_type_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;

        create_test_category(&db, user.id, "Gifts", CategoryType::Expense).await?;
        let result = create_category(
            &db,
            user.id,
            new_category(" Gifts", CategoryType::Expense, None),
        )
        .await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        // Same name under the other type is allowed
        let income =
            create_category(&db, user.id, new_category("Gifts", CategoryType::Income, None))
                .await?;
        assert_eq!(income.category_type, CategoryType::Income);

        // Another user may reuse the name freely
        let other = create_test_user(&db, "other@example.com").await?;
        create_test_category(&db, other.id, "Gifts", CategoryType::Expense).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_names_are_case_sensitive() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;

        create_test_category(&db, user.id, "Travel", CategoryType::Expense).await?;
        let lower = create_test_category(&db, user.id, "travel", CategoryType::Expense).await?;
        assert_eq!(lower.name, "travel");

        Ok(())
    }

    #[tokio::test]
    async fn test_parent_must_match_type() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;

        let salary = create_test_category(&db, user.id, "Salary", CategoryType::Income).await?;
        let result = create_category(
            &db,
            user.id,
            new_category("Snacks", CategoryType::Expense, Some(salary.id)),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let child = create_category(
            &db,
            user.id,
            new_category("Overtime", CategoryType::Income, Some(salary.id)),
        )
        .await?;
        assert_eq!(child.parent_id, Some(salary.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_parent_must_belong_to_user() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;
        let other = create_test_user(&db, "other@example.com").await?;

        let foreign = create_test_category(&db, other.id, "Food", CategoryType::Expense).await?;
        let result = create_category(
            &db,
            user.id,
            new_category("Snacks", CategoryType::Expense, Some(foreign.id)),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_type_change() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;
        let food = create_test_category(&db, user.id, "Food", CategoryType::Expense).await?;

        let mut update = reparent(&food, None);
        update.category_type = Some(CategoryType::Income);
        let result = update_category(&db, user.id, food.id, update).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        // Supplying the current type is fine
        let mut update = reparent(&food, None);
        update.category_type = Some(CategoryType::Expense);
        update.name = "Food & Drinks".to_string();
        let updated = update_category(&db, user.id, food.id, update).await?;
        assert_eq!(updated.name, "Food & Drinks");
        assert_eq!(updated.category_type, CategoryType::Expense);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_name_uniqueness_excludes_self() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;
        let food = create_test_category(&db, user.id, "Food", CategoryType::Expense).await?;
        create_test_category(&db, user.id, "Rent", CategoryType::Expense).await?;

        // Keeping its own name is not a clash
        let mut update = reparent(&food, None);
        update.is_active = false;
        let updated = update_category(&db, user.id, food.id, update).await?;
        assert!(!updated.is_active);

        let mut update = reparent(&food, None);
        update.name = "Rent".to_string();
        let result = update_category(&db, user.id, food.id, update).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_self_parent() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;
        let food = create_test_category(&db, user.id, "Food", CategoryType::Expense).await?;

        let result = update_category(&db, user.id, food.id, reparent(&food, Some(food.id))).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_cycle_and_allows_unrelated_root() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;

        // A -> B -> C
        let a = create_test_category(&db, user.id, "A", CategoryType::Expense).await?;
        let b = create_category(&db, user.id, new_category("B", CategoryType::Expense, Some(a.id)))
            .await?;
        let c = create_category(&db, user.id, new_category("C", CategoryType::Expense, Some(b.id)))
            .await?;
        let root = create_test_category(&db, user.id, "Root", CategoryType::Expense).await?;

        let result = update_category(&db, user.id, a.id, reparent(&a, Some(c.id))).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = update_category(&db, user.id, a.id, reparent(&a, Some(b.id))).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let moved = update_category(&db, user.id, a.id, reparent(&a, Some(root.id))).await?;
        assert_eq!(moved.parent_id, Some(root.id));

        // The rejected attempts left A untouched until the successful move
        let c_after = get_category(&db, user.id, c.id).await?;
        assert_eq!(c_after.parent_id, Some(b.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_detaches_with_zero_parent() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;
        let a = create_test_category(&db, user.id, "A", CategoryType::Income).await?;
        let b = create_category(&db, user.id, new_category("B", CategoryType::Income, Some(a.id)))
            .await?;

        let detached = update_category(&db, user.id, b.id, reparent(&b, Some(0))).await?;
        assert_eq!(detached.parent_id, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_not_found_for_other_user() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "owner@example.com").await?;
        let intruder = create_test_user(&db, "intruder@example.com").await?;
        let food = create_test_category(&db, owner.id, "Food", CategoryType::Expense).await?;

        let result = update_category(&db, intruder.id, food.id, reparent(&food, None)).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_lifts_children_only() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;

        let a = create_test_category(&db, user.id, "A", CategoryType::Expense).await?;
        let b = create_category(&db, user.id, new_category("B", CategoryType::Expense, Some(a.id)))
            .await?;
        let c = create_category(&db, user.id, new_category("C", CategoryType::Expense, Some(b.id)))
            .await?;

        delete_category(&db, user.id, a.id).await?;

        let b_after = get_category(&db, user.id, b.id).await?;
        assert_eq!(b_after.parent_id, None);
        let c_after = get_category(&db, user.id, c.id).await?;
        assert_eq!(c_after.parent_id, Some(b.id));

        let result = get_category(&db, user.id, a.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;

        let result = delete_category(&db, user.id, 12345).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "Category",
                id: 12345
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_rejects_category_in_use() -> Result<()> {
        let (db, user, account) = setup_with_account().await?;
        let food = create_test_category(&db, user.id, "Food", CategoryType::Expense).await?;
        create_test_expense(&db, user.id, account.id, food.id, rust_decimal_macros::dec!(10))
            .await?;

        let result = delete_category(&db, user.id, food.id).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        assert!(get_category(&db, user.id, food.id).await.is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn test_list_orders_by_type_then_name() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "u@example.com").await?;

        create_test_category(&db, user.id, "Rent", CategoryType::Expense).await?;
        create_test_category(&db, user.id, "Bonus", CategoryType::Income).await?;
        create_test_category(&db, user.id, "Food", CategoryType::Expense).await?;
        create_test_category(&db, user.id, "Salary", CategoryType::Income).await?;

        let names: Vec<String> = list_categories(&db, user.id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Bonus", "Salary", "Food", "Rent"]);

        // Listing twice gives the same order
        let again: Vec<String> = list_categories(&db, user.id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, again);

        Ok(())
    }
}
