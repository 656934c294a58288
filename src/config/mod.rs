pub mod job_config;

pub use job_config::JobConfig;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

#[cfg(feature = "cli")]
mod cli {
    use super::JobConfig;
    use crate::utils::error::Result;
    use clap::{Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "odroute-etl")]
    #[command(about = "Sample origin/destination points in survey zones and route them through OpenRouteService")]
    pub struct CliConfig {
        /// Path to a TOML job file; built-in defaults are used when omitted
        #[arg(short, long)]
        pub config: Option<String>,

        /// Override routing.base_url
        #[arg(long)]
        pub server: Option<String>,

        /// Override job.data_dir
        #[arg(long)]
        pub data_dir: Option<String>,

        /// Override sampling.seed
        #[arg(long)]
        pub seed: Option<u64>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Sample point pairs inside the origin/destination zones of every survey trip
        SamplePoints {
            #[arg(long)]
            points_per_zone: Option<usize>,
        },
        /// Route previously sampled point pairs for every profile
        RoutePoints {
            /// Only route the first N pairs
            #[arg(long)]
            limit: Option<usize>,
        },
        /// Draw random node pairs and route them for every profile
        RouteRandom {
            #[arg(long)]
            count: Option<usize>,
        },
    }

    impl CliConfig {
        /// Loads the job file (or defaults) and applies command-line overrides.
        pub fn job_config(&self) -> Result<JobConfig> {
            let mut config = match &self.config {
                Some(path) => JobConfig::from_file(path)?,
                None => JobConfig::default(),
            };

            if let Some(server) = &self.server {
                config.routing.base_url = server.clone();
            }
            if let Some(data_dir) = &self.data_dir {
                config.job.data_dir = data_dir.clone();
            }
            if let Some(seed) = self.seed {
                config.sampling.seed = Some(seed);
            }

            match &self.command {
                Command::SamplePoints {
                    points_per_zone: Some(n),
                } => config.sampling.points_per_zone = *n,
                Command::RouteRandom { count: Some(n) } => config.random_pairs.count = *n,
                _ => {}
            }

            Ok(config)
        }
    }

}
