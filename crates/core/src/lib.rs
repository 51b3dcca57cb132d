//! Core deck logic. Keep this crate free of IO and platform concerns.

pub mod action;
pub mod cards;
pub mod catalog;
pub mod composer;
pub mod config;
pub mod deck;
pub mod events;
pub mod rng;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod type_expr;

pub use action::*;
pub use cards::*;
pub use catalog::*;
pub use composer::*;
pub use config::*;
pub use deck::*;
pub use events::*;
pub use rng::*;
pub use session::*;
pub use snapshot::*;
pub use store::*;
pub use type_expr::*;
