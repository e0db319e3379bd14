//! # Cart
//!
//! A session's cart: which menu items were picked and how many of each.
//!
//! ## Structure
//!
//! - [`entity`] - the [`Cart`] value and its [`StateEntity`](dinein_actor::StateEntity) impl
//! - [`actions`] - [`CartAction`] and the [`CartTotals`] every action returns
//! - [`store`] - [`CartStore`], the handle wrapper the rest of the crate uses
//! - [`new()`] - factory for the actor and its handle
//!
//! ## Usage
//!
//! ```rust
//! use dinein::cart::{self, CartStore};
//! use dinein::model::{MenuItem, SessionId};
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, handle) = cart::new(8);
//!     tokio::spawn(actor.run());
//!     let carts = CartStore::new(handle);
//!
//!     let kottu: MenuItem = serde_json::from_str(
//!         r#"{"itemId": 1, "name": "Kottu", "itemCode": "10001", "category": "Mains", "price": 4.5}"#,
//!     )?;
//!     let session = SessionId(1);
//!     carts.add_item(session, &kottu, 2).await?;
//!     let totals = carts.add_item(session, &kottu, 1).await?;
//!     assert_eq!(totals.items, 3);
//!     assert_eq!(totals.price, Decimal::new(135, 1));
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod store;

pub use actions::*;
pub use entity::Cart;
pub use store::CartStore;

use dinein_actor::{StateActor, StateHandle};

/// Creates the cart actor and its handle.
pub fn new(buffer: usize) -> (StateActor<Cart>, StateHandle<Cart>) {
    StateActor::new(buffer)
}
