//! Wire and domain types shared by every component.

pub mod ids;
pub mod menu;
pub mod order;
pub mod people;

pub use ids::*;
pub use menu::*;
pub use order::*;
pub use people::*;
