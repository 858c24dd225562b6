pub mod config;
pub mod item;
pub mod list;
pub mod store;

pub use config::*;
pub use item::*;
pub use list::*;
pub use store::*;
