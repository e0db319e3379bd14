//! Catalog types: categories and menu items.

use crate::model::{CategoryId, MenuItemId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
    pub category_code: String,
}

/// Body for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    pub category_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[default]
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub item_id: MenuItemId,
    pub name: String,
    pub item_code: String,
    /// Category name.
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
}

impl MenuItem {
    pub fn is_available(&self) -> bool {
        self.status == ItemStatus::Available
    }
}

/// Body for creating or updating a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDraft {
    pub name: String,
    pub item_code: String,
    pub category: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub status: ItemStatus,
}

impl MenuItemDraft {
    /// Draft with an empty item code, to be filled from the code generator.
    pub fn new(name: impl Into<String>, category: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            item_code: String::new(),
            category: category.into(),
            description: None,
            price,
            image_url: None,
            status: ItemStatus::Available,
        }
    }
}

impl From<&MenuItem> for MenuItemDraft {
    fn from(item: &MenuItem) -> Self {
        Self {
            name: item.name.clone(),
            item_code: item.item_code.clone(),
            category: item.category.clone(),
            description: item.description.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            status: item.status,
        }
    }
}
