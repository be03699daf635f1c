//! User business logic - Registration, lookup and the admin-side flags.
//!
//! Password handling and sessions belong to the auth layer; registration here only
//! creates the ownership anchor and seeds the user's starter categories.

use crate::{
    config::categories::CategoryCatalogue,
    core::seed::seed_default_categories,
    entities::{User, UserRole, user},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

const MAX_EMAIL_LEN: usize = 190;

/// Creates a user and seeds their default categories in one database transaction.
///
/// The email is trimmed and must be non-empty, contain `@` and fit in 190 characters.
///
/// # Errors
/// - `Validation` for a malformed email
/// - `Conflict` if another user already has the email
pub async fn register_user(
    db: &DatabaseConnection,
    email: &str,
    name: Option<String>,
    catalogue: &CategoryCatalogue,
) -> Result<user::Model> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::validation("Email is not valid"));
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(Error::validation(format!(
            "Email cannot exceed {MAX_EMAIL_LEN} characters"
        )));
    }

    let txn = db.begin().await?;

    let taken = User::find()
        .filter(user::Column::Email.eq(email))
        .one(&txn)
        .await?;
    if taken.is_some() {
        return Err(Error::conflict("Email is already registered"));
    }

    let user = user::ActiveModel {
        email: Set(email.to_string()),
        name: Set(name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())),
        is_active: Set(true),
        role: Set(UserRole::User),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    seed_default_categories(&txn, user.id, catalogue).await?;

    txn.commit().await?;

    info!(user_id = user.id, "Registered user");
    Ok(user)
}

/// Finds a user by id.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "User",
            id: user_id,
        })
}

/// Page size used when the caller has no preference.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

const MAX_PAGE_SIZE: u64 = 100;

/// One page of users plus the number of users matching overall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPage {
    /// Users on this page, newest first
    pub items: Vec<user::Model>,
    /// 1-based page number
    pub page: u64,
    /// Requested page size
    pub page_size: u64,
    /// Users matching the keyword across all pages
    pub total: u64,
}

/// Lists users newest first, optionally narrowed by a keyword matched against email and name.
///
/// `page` is 1-based. A page past the end comes back empty with the real `total`.
///
/// # Errors
/// Returns `Validation` if `page` is 0 or `page_size` is outside 1-100.
pub async fn list_users(
    db: &DatabaseConnection,
    keyword: Option<&str>,
    page: u64,
    page_size: u64,
) -> Result<UserPage> {
    if page == 0 {
        return Err(Error::validation("Page must be at least 1"));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(Error::validation(format!(
            "Page size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let mut query = User::find();

    if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(user::Column::Email.contains(keyword))
                .add(user::Column::Name.contains(keyword)),
        );
    }

    let paginator = query
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .paginate(db, page_size);

    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(UserPage {
        items,
        page,
        page_size,
        total,
    })
}

/// Activates or deactivates a user. Deactivation is a soft flag; nothing is deleted.
#[instrument(skip(db))]
pub async fn set_user_active(
    db: &DatabaseConnection,
    user_id: i64,
    is_active: bool,
) -> Result<user::Model> {
    let mut user: user::ActiveModel = get_user(db, user_id).await?.into();
    user.is_active = Set(is_active);
    user.update(db).await.map_err(Into::into)
}

/// Changes a user's role.
#[instrument(skip(db))]
pub async fn set_user_role(
    db: &DatabaseConnection,
    user_id: i64,
    role: UserRole,
) -> Result<user::Model> {
    let mut user: user::ActiveModel = get_user(db, user_id).await?.into();
    user.role = Set(role);
    user.update(db).await.map_err(Into::into)
}
