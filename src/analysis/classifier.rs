use crate::core::schema::CategoryRule;
use serde::{Deserialize, Serialize};

/// A category and the columns assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub columns: Vec<String>,
}

impl Category {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Result of [`classify`]: every configured category, in rule order.
///
/// This is an overlay, not a partition. A column can sit in several
/// categories or in none, and categorisation never removes a column from
/// full-table operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMap {
    categories: Vec<Category>,
}

impl CategoryMap {
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.columns.as_slice())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Categories that matched at least one column.
    pub fn non_empty(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| !c.is_empty())
    }
}

/// Assign columns to categories by case-sensitive substring markers.
///
/// A category with no matching column is kept with an empty column list.
///
/// ```
/// use balance_sheet_analytics::analysis::classifier::classify;
/// use balance_sheet_analytics::core::schema::CategoryRule;
///
/// let columns = vec!["Cash on Hand".to_string(), "Other Assets".to_string()];
/// let rules = vec![
///     CategoryRule::new("Cash and Balances", ["Cash"]),
///     CategoryRule::new("Investments", ["Investments"]),
/// ];
/// let map = classify(&columns, &rules);
/// assert_eq!(map.get("Cash and Balances"), Some(&["Cash on Hand".to_string()][..]));
/// assert_eq!(map.get("Investments"), Some(&[][..]));
/// ```
pub fn classify(columns: &[String], rules: &[CategoryRule]) -> CategoryMap {
    let categories = rules
        .iter()
        .map(|rule| {
            let matched: Vec<String> = columns
                .iter()
                .filter(|c| rule.matches(c))
                .cloned()
                .collect();
            if matched.is_empty() {
                log::debug!("category '{}' matched no columns", rule.name);
            }
            Category {
                name: rule.name.clone(),
                columns: matched,
            }
        })
        .collect();
    CategoryMap { categories }
}
