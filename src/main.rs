use clap::Parser;
use odroute_etl::utils::{logger, validation::Validate};
use odroute_etl::{
    CliConfig, Command, EtlEngine, EtlError, JobConfig, LocalStorage, OrsClient, PairSource,
    PointSamplingPipeline, RoutingPipeline,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting odroute-etl");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.job_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    tracing::info!(
        "Job '{}' in {} (started {})",
        config.job.name,
        config.job.data_dir,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    match run(cli.command, config).await {
        Ok(output_path) => {
            tracing::info!("✅ Job completed successfully!");
            println!("✅ Job completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Job failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(command: Command, config: JobConfig) -> Result<String, EtlError> {
    let storage = LocalStorage::new(config.job.data_dir.clone());

    match command {
        Command::SamplePoints { .. } => {
            let pipeline = PointSamplingPipeline::new(storage, config);
            EtlEngine::new(pipeline).run().await
        }
        Command::RoutePoints { limit } => {
            let client = OrsClient::new(&config.routing)?;
            let pipeline =
                RoutingPipeline::new(storage, config, client, PairSource::SampledPoints { limit });
            EtlEngine::new(pipeline).run().await
        }
        Command::RouteRandom { .. } => {
            let client = OrsClient::new(&config.routing)?;
            let pipeline = RoutingPipeline::new(storage, config, client, PairSource::RandomNodes);
            EtlEngine::new(pipeline).run().await
        }
    }
}
