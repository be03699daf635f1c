//! Default-category catalogue used to seed new users.
//!
//! The catalogue can be overridden with a `config.toml` holding `[[expense]]` and
//! `[[income]]` tables. Without one, the built-in list is used.

use crate::{
    core::category::{MAX_COLOR_LEN, MAX_ICON_LEN, MAX_NAME_LEN},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::{collections::HashSet, path::Path};
use tracing::{debug, info};

/// One starter category: a name/icon/color triple.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CategorySeed {
    /// Category name
    pub name: String,
    /// Display icon
    pub icon: String,
    /// Display color
    pub color: String,
}

impl CategorySeed {
    fn new(name: &str, icon: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
        }
    }
}

/// The full list of starter categories inserted at registration.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CategoryCatalogue {
    /// Expense categories, inserted first
    #[serde(default)]
    pub expense: Vec<CategorySeed>,
    /// Income categories
    #[serde(default)]
    pub income: Vec<CategorySeed>,
}

impl CategoryCatalogue {
    /// The catalogue shipped with the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            expense: vec![
                CategorySeed::new("Food & Dining", "🍽️", "#f59e0b"),
                CategorySeed::new("Daily Spending", "🧾", "#9ca3af"),
                CategorySeed::new("Clothing", "👕", "#a855f7"),
                CategorySeed::new("Cosmetics", "💄", "#f472b6"),
                CategorySeed::new("Social", "🫱🏻‍🫲🏼", "#22c55e"),
                CategorySeed::new("Health", "🩺", "#ef4444"),
                CategorySeed::new("Education", "📚", "#06b6d4"),
                CategorySeed::new("Electricity", "⚡", "#fde047"),
                CategorySeed::new("Transport", "🚗", "#3b82f6"),
                CategorySeed::new("Phone & Internet", "📞", "#10b981"),
                CategorySeed::new("Housing", "🏠", "#8b5cf6"),
            ],
            income: vec![
                CategorySeed::new("Salary", "💵", "#16a34a"),
                CategorySeed::new("Allowance", "💰", "#22c55e"),
                CategorySeed::new("Bonus", "🏆", "#84cc16"),
                CategorySeed::new("Side Income", "🪙", "#4ade80"),
                CategorySeed::new("Investment", "📈", "#0ea5e9"),
            ],
        }
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expense.len() + self.income.len()
    }

    /// True when neither list has entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks every entry against the rules user-created categories follow.
    ///
    /// Names are trimmed, must be non-empty, fit in 120 characters and be unique within
    /// their list (case-sensitive). Icons fit in 64 characters, colors in 16.
    ///
    /// # Errors
    /// Returns `Config` naming the first offending entry.
    pub fn validate(&self) -> Result<()> {
        validate_list("expense", &self.expense)?;
        validate_list("income", &self.income)
    }
}

fn validate_list(kind: &str, seeds: &[CategorySeed]) -> Result<()> {
    let mut seen = HashSet::new();
    for seed in seeds {
        let name = seed.name.trim();
        if name.is_empty() {
            return Err(config_error(format!("An {kind} category has an empty name")));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(config_error(format!(
                "{kind} category {name:?} exceeds {MAX_NAME_LEN} characters"
            )));
        }
        if seed.icon.chars().count() > MAX_ICON_LEN {
            return Err(config_error(format!(
                "{kind} category {name:?} has an icon over {MAX_ICON_LEN} characters"
            )));
        }
        if seed.color.chars().count() > MAX_COLOR_LEN {
            return Err(config_error(format!(
                "{kind} category {name:?} has a color over {MAX_COLOR_LEN} characters"
            )));
        }
        if !seen.insert(name) {
            return Err(config_error(format!(
                "{kind} category {name:?} is listed more than once"
            )));
        }
    }
    Ok(())
}

fn config_error(message: String) -> Error {
    Error::Config { message }
}

impl Default for CategoryCatalogue {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Loads a catalogue from a TOML file.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - An entry is missing its name, icon or color
/// - An entry fails [`CategoryCatalogue::validate`]
pub fn load_catalogue<P: AsRef<Path>>(path: P) -> Result<CategoryCatalogue> {
    let path_ref = path.as_ref();
    debug!("Loading category catalogue from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    let catalogue: CategoryCatalogue = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {path_ref:?}: {e}"),
    })?;
    catalogue.validate()?;
    Ok(catalogue)
}

/// Loads `./config.toml` when it exists, otherwise returns the built-in catalogue.
pub fn load_default_catalogue() -> Result<CategoryCatalogue> {
    let path = Path::new("config.toml");
    if path.exists() {
        let catalogue = load_catalogue(path)?;
        info!(
            "Using category catalogue from config.toml ({} entries)",
            catalogue.len()
        );
        Ok(catalogue)
    } else {
        info!("No config.toml found, using built-in category catalogue");
        Ok(CategoryCatalogue::builtin())
    }
}
