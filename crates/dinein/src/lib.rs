//! # dinein
//!
//! Client core for a restaurant ordering system backed by a REST server.
//!
//! ## Components
//!
//! - **[cart]**: per-session cart held in a state actor.
//! - **[checkout]**: turns a cart into exactly one placed order.
//! - **[status]**: polls one order and publishes a stale-safe view of it.
//! - **[kitchen]**: the staff queue, with optimistic status changes that roll back on failure.
//! - **[codes]**: next category and item code suggestions.
//! - **[catalog]**, **[menu]**, **[auth]**, **[history]**: admin catalog editing, the customer
//!   menu, logins and past orders.
//! - **[api]**: the [`Api`] trait and its HTTP implementation.
//! - **[lifecycle]**: [`DineIn`], which starts the actors and wires everything together.
//!
//! ## Testing
//!
//! [`testing::ScriptedApi`] replaces the server with per-call scripted replies.

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod codes;
pub mod config;
pub mod error;
pub mod history;
pub mod kitchen;
pub mod lifecycle;
pub mod menu;
pub mod model;
mod poller;
pub mod session;
pub mod status;
pub mod testing;

pub use api::{Api, HttpApi};
pub use config::DineInConfig;
pub use error::{ApiError, DineInError, Result, ValidationError};
pub use lifecycle::DineIn;
