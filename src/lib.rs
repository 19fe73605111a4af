pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::storage::LocalStorage;
pub use app::builder::build_pipeline;
pub use config::AppConfig;
pub use core::{engine::SearchEngine, pipeline::FareSearchPipeline};
pub use utils::error::{FareError, Result};
