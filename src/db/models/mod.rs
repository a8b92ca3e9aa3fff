pub mod shop;
pub mod snapshot;

pub use shop::{RegisteredShop, Shop};
pub use snapshot::Snapshot;
