//! Customer-facing menu listing.

use crate::api::Api;
use crate::error::DineInError;
use crate::model::{Category, MenuItem, MenuItemId};
use tracing::{debug, instrument};

/// Available items of one category, in server order.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuSection {
    pub category: Category,
    pub items: Vec<MenuItem>,
}

/// A loaded snapshot of the menu. Only available items are listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Menu {
    categories: Vec<Category>,
    items: Vec<MenuItem>,
}

impl Menu {
    pub fn new(categories: Vec<Category>, items: Vec<MenuItem>) -> Self {
        let items = items.into_iter().filter(MenuItem::is_available).collect();
        Self { categories, items }
    }

    #[instrument(skip(api))]
    pub async fn load(api: &dyn Api) -> Result<Self, DineInError> {
        let (categories, items) = tokio::try_join!(api.categories(), api.menu_items())?;
        debug!(categories = categories.len(), items = items.len(), "Menu loaded");
        Ok(Self::new(categories, items))
    }

    /// Server-side name search, restricted to available items.
    #[instrument(skip(api))]
    pub async fn search(api: &dyn Api, name: &str) -> Result<Vec<MenuItem>, DineInError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Self::load(api).await?.items);
        }
        let mut items = api.search_menu(name).await?;
        items.retain(MenuItem::is_available);
        Ok(items)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn item(&self, id: &MenuItemId) -> Option<&MenuItem> {
        self.items.iter().find(|i| &i.item_id == id)
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a MenuItem> + 'a {
        self.items.iter().filter(move |i| i.category == category)
    }

    /// One section per category that has at least one available item.
    pub fn sections(&self) -> Vec<MenuSection> {
        self.categories
            .iter()
            .filter_map(|category| {
                let items: Vec<_> = self.in_category(&category.name).cloned().collect();
                (!items.is_empty()).then(|| MenuSection {
                    category: category.clone(),
                    items,
                })
            })
            .collect()
    }

    /// Case-insensitive name filter over the loaded items.
    pub fn filter(&self, query: &str) -> Vec<&MenuItem> {
        let query = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|i| i.name.to_lowercase().contains(&query))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryId, ItemStatus};
    use crate::testing::{Endpoint, ScriptedApi};
    use rust_decimal::Decimal;

    fn item(id: u64, name: &str, category: &str, status: ItemStatus) -> MenuItem {
        MenuItem {
            item_id: MenuItemId::from(id),
            name: name.into(),
            item_code: format!("10{id:03}"),
            category: category.into(),
            description: None,
            price: Decimal::new(1200, 2),
            image_url: None,
            status,
        }
    }

    fn menu() -> Menu {
        Menu::new(
            vec![
                Category {
                    category_id: CategoryId::from(1),
                    name: "Mains".into(),
                    category_code: "10".into(),
                },
                Category {
                    category_id: CategoryId::from(2),
                    name: "Drinks".into(),
                    category_code: "20".into(),
                },
                Category {
                    category_id: CategoryId::from(3),
                    name: "Desserts".into(),
                    category_code: "30".into(),
                },
            ],
            vec![
                item(1, "Chicken Kottu", "Mains", ItemStatus::Available),
                item(2, "Fried Rice", "Mains", ItemStatus::Available),
                item(3, "Iced Coffee", "Drinks", ItemStatus::Available),
                item(4, "Watalappan", "Desserts", ItemStatus::Unavailable),
            ],
        )
    }

    #[test]
    fn test_unavailable_items_are_hidden() {
        let menu = menu();
        assert_eq!(menu.items().len(), 3);
        assert!(menu.item(&MenuItemId::from(4)).is_none());
    }

    #[test]
    fn test_sections_skip_empty_categories() {
        let sections = menu().sections();
        let names: Vec<_> = sections.iter().map(|s| s.category.name.as_str()).collect();
        assert_eq!(names, ["Mains", "Drinks"]);
        assert_eq!(sections[0].items.len(), 2);
    }

    #[test]
    fn test_filter_ignores_case() {
        let menu = menu();
        let hits: Vec<_> = menu.filter("KOTTU").iter().map(|i| i.name.clone()).collect();
        assert_eq!(hits, ["Chicken Kottu"]);
        assert_eq!(menu.filter("").len(), 3);
    }

    #[tokio::test]
    async fn test_search_uses_server_and_drops_unavailable() {
        let api = ScriptedApi::new();
        api.push_ok(
            Endpoint::SearchMenu,
            vec![
                item(1, "Chicken Kottu", "Mains", ItemStatus::Available),
                item(5, "Cheese Kottu", "Mains", ItemStatus::Unavailable),
            ],
        );

        let items = Menu::search(&api, "kottu").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Chicken Kottu");
        api.verify();
    }
}
