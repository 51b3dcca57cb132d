//! Card catalog loading and snapshot persistence on the local filesystem.

pub mod load;
pub mod schema;
pub mod store;

pub use load::*;
pub use schema::*;
pub use store::*;
