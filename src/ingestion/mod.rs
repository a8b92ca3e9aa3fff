pub mod controller;
pub mod cycle;
mod loop_worker;

pub use controller::ScrapeController;
pub use cycle::{
    ingest_reading, run_cycle, CycleOptions, CycleReport, ShopUpdate, SkipReason, SkippedShop,
};
