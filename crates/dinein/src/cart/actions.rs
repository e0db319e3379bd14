//! Cart mutations.

use crate::model::{CartLine, MenuItem, MenuItemId};
use rust_decimal::Decimal;

/// Quantities are signed so that a decrement below zero can be expressed and treated as a
/// removal rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Merge into the existing line or append a new one. `quantity <= 0` is a no-op.
    AddItem { item: MenuItem, quantity: i32 },
    /// Replace the quantity; `<= 0` removes the line. Unknown ids are ignored.
    SetQuantity { menu_item_id: MenuItemId, quantity: i32 },
    Remove(MenuItemId),
    /// Subtract lines that were sent in an order. Lines that reach zero are removed and
    /// anything added since the order was built stays.
    RemoveOrdered(Vec<CartLine>),
    Clear,
}

/// Totals after an action, for the cart badge and the checkout summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    pub items: u32,
    pub price: Decimal,
}
