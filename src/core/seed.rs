//! Default-category seeding for new users.

use crate::{
    config::categories::{CategoryCatalogue, CategorySeed},
    entities::{Category, CategoryType, category},
    errors::Result,
};
use sea_orm::{Set, prelude::*};
use tracing::{debug, info};

/// Inserts the catalogue's categories for `user_id` with `is_default = true`.
///
/// Idempotent: if the user already owns any category nothing is inserted and 0 is
/// returned. Otherwise every expense entry is inserted, then every income entry, all as
/// active roots. Returns the number of categories inserted.
///
/// Accepts any connection so registration can seed inside its own database transaction.
///
/// # Errors
/// Returns `Config` if the catalogue fails [`CategoryCatalogue::validate`]; nothing is
/// inserted in that case.
pub async fn seed_default_categories<C>(
    db: &C,
    user_id: i64,
    catalogue: &CategoryCatalogue,
) -> Result<usize>
where
    C: ConnectionTrait,
{
    catalogue.validate()?;

    let existing = Category::find()
        .filter(category::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    if existing > 0 {
        debug!(user_id, existing, "User already has categories, skipping seed");
        return Ok(0);
    }

    let rows: Vec<category::ActiveModel> = catalogue
        .expense
        .iter()
        .map(|seed| default_category(user_id, CategoryType::Expense, seed))
        .chain(
            catalogue
                .income
                .iter()
                .map(|seed| default_category(user_id, CategoryType::Income, seed)),
        )
        .collect();

    let inserted = rows.len();
    if inserted > 0 {
        Category::insert_many(rows).exec(db).await?;
    }

    info!(user_id, inserted, "Seeded default categories");
    Ok(inserted)
}

fn default_category(
    user_id: i64,
    category_type: CategoryType,
    seed: &CategorySeed,
) -> category::ActiveModel {
    category::ActiveModel {
        user_id: Set(user_id),
        name: Set(seed.name.trim().to_string()),
        category_type: Set(category_type),
        parent_id: Set(None),
        color: Set(Some(seed.color.clone())),
        icon: Set(Some(seed.icon.clone())),
        is_active: Set(true),
        is_default: Set(true),
        ..Default::default()
    }
}
