pub mod shops;
pub mod snapshots;

pub use shops::ShopRepository;
pub use snapshots::SnapshotRepository;
