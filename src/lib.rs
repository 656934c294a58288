pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{LocalStorage, OrsClient};
pub use app::pipelines::{PairSource, PointSamplingPipeline, RoutingPipeline};
pub use config::JobConfig;
pub use crate::core::etl::EtlEngine;
pub use utils::error::{EtlError, Result};
