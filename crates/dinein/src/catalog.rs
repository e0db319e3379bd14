//! # Catalog administration
//!
//! The admin view of categories and menu items. It keeps the last loaded lists so that the
//! next category code and the next item code of each category can be suggested without a
//! round trip. Suggestions are recomputed from whatever the lists hold after every write.
//!
//! The server has the final say on code uniqueness. When it rejects a write as a
//! conflict (another admin took the code first), the lists are reloaded before the error
//! is returned, so the next suggestion is already correct.

use crate::api::Api;
use crate::codes::{self, CategoryCode, CodeError, ItemCode};
use crate::error::{ApiError, DineInError, ValidationError};
use crate::model::{Category, CategoryDraft, CategoryId, MenuItem, MenuItemDraft, MenuItemId};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct CatalogAdmin {
    api: Arc<dyn Api>,
    categories: Vec<Category>,
    items: Vec<MenuItem>,
}

impl CatalogAdmin {
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self {
            api,
            categories: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Loads categories and items together.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<(), DineInError> {
        let (categories, items) = tokio::try_join!(self.api.categories(), self.api.menu_items())?;
        info!(categories = categories.len(), items = items.len(), "Catalog loaded");
        self.categories = categories;
        self.items = items;
        Ok(())
    }

    pub fn next_category_code(&self) -> Result<CategoryCode, CodeError> {
        codes::next_category_code(self.categories.iter().map(|c| c.category_code.as_str()))
    }

    /// Next item code under the named category.
    pub fn next_item_code(&self, category: &str) -> Result<ItemCode, DineInError> {
        let category = self
            .category_by_name(category)
            .ok_or_else(|| ValidationError::UnknownCategory(category.to_string()))?;
        Ok(codes::next_item_code(
            &category.category_code,
            self.items.iter().map(|i| i.item_code.as_str()),
        )?)
    }

    async fn rejected(&mut self, e: ApiError) -> DineInError {
        if e.is_conflict() {
            warn!(error = %e, "Write rejected, reloading catalog");
            if let Err(reload) = self.refresh().await {
                warn!(error = %reload, "Catalog reload failed");
            }
        }
        e.into()
    }

    fn category_draft(&self, name: &str, code: Option<&str>) -> Result<CategoryDraft, DineInError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::BlankField("Category name").into());
        }
        let code = match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => CategoryCode::parse(code)
                .map_err(|_| ValidationError::InvalidCode(code.to_string()))?,
            None => self.next_category_code()?,
        };
        Ok(CategoryDraft {
            name: name.to_string(),
            category_code: code.into(),
        })
    }

    /// Creates a category, using the suggested code when `code` is `None` or blank.
    #[instrument(skip(self))]
    pub async fn add_category(&mut self, name: &str, code: Option<&str>) -> Result<Category, DineInError> {
        let draft = self.category_draft(name, code)?;
        match self.api.create_category(&draft).await {
            Ok(category) => {
                info!(code = %category.category_code, "Category created");
                self.categories.push(category.clone());
                Ok(category)
            }
            Err(e) => Err(self.rejected(e).await),
        }
    }

    #[instrument(skip(self))]
    pub async fn update_category(
        &mut self,
        id: &CategoryId,
        name: &str,
        code: &str,
    ) -> Result<Category, DineInError> {
        let draft = self.category_draft(name, Some(code))?;
        match self.api.update_category(id, &draft).await {
            Ok(category) => {
                match self.categories.iter_mut().find(|c| &c.category_id == id) {
                    Some(slot) => *slot = category.clone(),
                    None => self.categories.push(category.clone()),
                }
                Ok(category)
            }
            Err(e) => Err(self.rejected(e).await),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&mut self, id: &CategoryId) -> Result<(), DineInError> {
        match self.api.delete_category(id).await {
            Ok(()) => {
                self.categories.retain(|c| &c.category_id != id);
                Ok(())
            }
            Err(e) => Err(self.rejected(e).await),
        }
    }

    fn check_item(&self, mut draft: MenuItemDraft) -> Result<MenuItemDraft, DineInError> {
        draft.name = draft.name.trim().to_string();
        if draft.name.is_empty() {
            return Err(ValidationError::BlankField("Name").into());
        }
        if draft.category.trim().is_empty() {
            return Err(ValidationError::BlankField("Category").into());
        }
        if draft.price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice.into());
        }

        let category = self
            .category_by_name(&draft.category)
            .ok_or_else(|| ValidationError::UnknownCategory(draft.category.clone()))?;
        let code = draft.item_code.trim();
        if code.is_empty() {
            draft.item_code = self.next_item_code(&draft.category)?.into();
        } else {
            let parsed = ItemCode::parse(code).map_err(|_| ValidationError::InvalidCode(code.to_string()))?;
            if parsed.category() != category.category_code {
                return Err(ValidationError::InvalidCode(code.to_string()).into());
            }
            draft.item_code = parsed.into();
        }
        Ok(draft)
    }

    /// Creates a menu item. A blank item code is filled from the category's next code.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn add_menu_item(&mut self, draft: MenuItemDraft) -> Result<MenuItem, DineInError> {
        let draft = self.check_item(draft)?;
        match self.api.create_menu_item(&draft).await {
            Ok(item) => {
                info!(code = %item.item_code, "Menu item created");
                self.items.push(item.clone());
                Ok(item)
            }
            Err(e) => Err(self.rejected(e).await),
        }
    }

    /// Updates a menu item. Moving it to another category needs a blank code so a new one
    /// is assigned.
    #[instrument(skip(self, draft))]
    pub async fn update_menu_item(
        &mut self,
        id: &MenuItemId,
        draft: MenuItemDraft,
    ) -> Result<MenuItem, DineInError> {
        let draft = self.check_item(draft)?;
        match self.api.update_menu_item(id, &draft).await {
            Ok(item) => {
                match self.items.iter_mut().find(|i| &i.item_id == id) {
                    Some(slot) => *slot = item.clone(),
                    None => self.items.push(item.clone()),
                }
                Ok(item)
            }
            Err(e) => Err(self.rejected(e).await),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_menu_item(&mut self, id: &MenuItemId) -> Result<(), DineInError> {
        match self.api.delete_menu_item(id).await {
            Ok(()) => {
                self.items.retain(|i| &i.item_id != id);
                Ok(())
            }
            Err(e) => Err(self.rejected(e).await),
        }
    }
}
