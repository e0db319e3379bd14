use crate::cart::actions::{CartAction, CartTotals};
use crate::model::{CartLine, MenuItem, MenuItemId, SessionId};
use dinein_actor::StateEntity;
use rust_decimal::Decimal;
use std::convert::Infallible;

/// Lines in the order they were first added. No two lines share a `menu_item_id`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, id: &MenuItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.menu_item_id == id)
    }

    pub fn quantity_of(&self, id: &MenuItemId) -> u32 {
        self.line(id).map_or(0, |line| line.quantity)
    }

    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals {
            items: self.total_items(),
            price: self.total_price(),
        }
    }

    pub fn add_item(&mut self, item: &MenuItem, quantity: i32) {
        let Ok(quantity) = u32::try_from(quantity) else {
            return;
        };
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|line| line.menu_item_id == item.item_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine {
                menu_item_id: item.item_id.clone(),
                name: item.name.clone(),
                item_code: item.item_code.clone(),
                unit_price: item.price,
                quantity,
            }),
        }
    }

    pub fn set_quantity(&mut self, id: &MenuItemId, quantity: i32) {
        match u32::try_from(quantity) {
            Ok(quantity) if quantity > 0 => {
                if let Some(line) = self.lines.iter_mut().find(|line| &line.menu_item_id == id) {
                    line.quantity = quantity;
                }
            }
            _ => self.remove_item(id),
        }
    }

    pub fn remove_item(&mut self, id: &MenuItemId) {
        self.lines.retain(|line| &line.menu_item_id != id);
    }

    pub fn remove_ordered(&mut self, ordered: &[CartLine]) {
        for sent in ordered {
            if let Some(line) = self
                .lines
                .iter_mut()
                .find(|line| line.menu_item_id == sent.menu_item_id)
            {
                line.quantity = line.quantity.saturating_sub(sent.quantity);
            }
        }
        self.lines.retain(|line| line.quantity > 0);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl StateEntity for Cart {
    type Id = SessionId;
    type Action = CartAction;
    type Output = CartTotals;
    type Error = Infallible;

    fn init(_: &SessionId) -> Self {
        Self::default()
    }

    fn apply(&mut self, action: CartAction) -> Result<CartTotals, Infallible> {
        match action {
            CartAction::AddItem { item, quantity } => self.add_item(&item, quantity),
            CartAction::SetQuantity {
                menu_item_id,
                quantity,
            } => self.set_quantity(&menu_item_id, quantity),
            CartAction::Remove(id) => self.remove_item(&id),
            CartAction::RemoveOrdered(lines) => self.remove_ordered(&lines),
            CartAction::Clear => self.clear(),
        }
        Ok(self.totals())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemStatus;

    fn item(id: u64, price: Decimal) -> MenuItem {
        MenuItem {
            item_id: MenuItemId::from(id),
            name: format!("Item {id}"),
            item_code: format!("10{id:03}"),
            category: "Mains".into(),
            description: None,
            price,
            image_url: None,
            status: ItemStatus::Available,
        }
    }

    #[test]
    fn test_repeat_add_merges_into_one_line() {
        let mut cart = Cart::default();
        let rice = item(1, Decimal::new(350, 2));
        cart.add_item(&rice, 2);
        cart.add_item(&rice, 3);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(&rice.item_id), 5);
        assert_eq!(cart.total_price(), Decimal::new(1750, 2));
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::default();
        cart.add_item(&item(2, Decimal::ONE), 1);
        cart.add_item(&item(1, Decimal::ONE), 1);
        cart.add_item(&item(2, Decimal::ONE), 1);

        let ids: Vec<_> = cart.lines().iter().map(|l| l.menu_item_id.clone()).collect();
        assert_eq!(ids, vec![MenuItemId::from(2), MenuItemId::from(1)]);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_non_positive_add_is_ignored() {
        let mut cart = Cart::default();
        cart.add_item(&item(1, Decimal::ONE), 0);
        cart.add_item(&item(1, Decimal::ONE), -2);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_or_less_removes() {
        let mut cart = Cart::default();
        let rice = item(1, Decimal::ONE);
        cart.add_item(&rice, 2);
        cart.set_quantity(&rice.item_id, 7);
        assert_eq!(cart.quantity_of(&rice.item_id), 7);

        cart.set_quantity(&rice.item_id, 0);
        assert!(cart.is_empty());

        cart.add_item(&rice, 1);
        cart.set_quantity(&rice.item_id, -1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_on_unknown_id_is_noop() {
        let mut cart = Cart::default();
        cart.add_item(&item(1, Decimal::ONE), 1);
        let before = cart.clone();
        cart.set_quantity(&MenuItemId::from(99), 4);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_apply_returns_totals() {
        let mut cart = Cart::default();
        let totals = cart
            .apply(CartAction::AddItem {
                item: item(1, Decimal::new(250, 2)),
                quantity: 4,
            })
            .unwrap();
        assert_eq!(totals.items, 4);
        assert_eq!(totals.price, Decimal::TEN);

        let totals = cart.apply(CartAction::Clear).unwrap();
        assert_eq!(totals, CartTotals::default());
    }

    #[test]
    fn test_remove_ordered_keeps_later_additions() {
        let mut cart = Cart::default();
        let rice = item(1, Decimal::ONE);
        let tea = item(2, Decimal::ONE);
        cart.add_item(&rice, 2);
        let ordered = cart.lines().to_vec();

        cart.add_item(&rice, 1);
        cart.add_item(&tea, 3);
        cart.remove_ordered(&ordered);

        assert_eq!(cart.quantity_of(&rice.item_id), 1);
        assert_eq!(cart.quantity_of(&tea.item_id), 3);

        let everything = cart.lines().to_vec();
        cart.remove_ordered(&everything);
        assert!(cart.is_empty());
    }

    /// Small xorshift so the sequence is reproducible without a seed file.
    struct Steps(u64);

    impl Steps {
        fn next(&mut self, bound: u64) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0 % bound
        }
    }

    #[test]
    fn test_random_edits_keep_one_line_per_item() {
        let menu: Vec<_> = (1..=6).map(|id| item(id, Decimal::new(id as i64 * 125, 2))).collect();
        let mut steps = Steps(0x9e37_79b9_7f4a_7c15);
        let mut cart = Cart::default();

        for step in 0..2_000 {
            let picked = &menu[steps.next(menu.len() as u64) as usize];
            let quantity = steps.next(9) as i32 - 3;
            let action = match steps.next(5) {
                0 | 1 => CartAction::AddItem {
                    item: picked.clone(),
                    quantity,
                },
                2 => CartAction::SetQuantity {
                    menu_item_id: picked.item_id.clone(),
                    quantity,
                },
                3 => CartAction::Remove(picked.item_id.clone()),
                _ => CartAction::RemoveOrdered(cart.lines().iter().take(2).cloned().collect()),
            };
            let totals = cart.apply(action.clone()).unwrap();

            let mut ids: Vec<_> = cart.lines().iter().map(|l| l.menu_item_id.clone()).collect();
            let count = ids.len();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), count, "Duplicate line after step {step}: {action:?}");
            assert!(cart.lines().iter().all(|l| l.quantity > 0), "Empty line after step {step}");

            let sum: u32 = cart.lines().iter().map(|l| l.quantity).sum();
            assert_eq!(cart.total_items(), sum);
            assert_eq!(totals.items, sum);
            assert_eq!(totals.price, cart.total_price());
        }
    }
}
