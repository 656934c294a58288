use crate::core::batch::RouteBatch;
use crate::core::random_pairs::{draw_node_pairs, read_nodes};
use crate::core::sampling::make_rng;
use crate::core::tables::{read_points, write_routes};
use crate::domain::model::{RouteBatchResult, SampledPair};
use crate::domain::ports::{ConfigProvider, Pipeline, RouteProvider, Storage};
use crate::utils::error::{EtlError, Result};
use rand::rngs::StdRng;
use std::sync::Mutex;

/// Where the pairs to route come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSource {
    /// The points file written by the sampling job, optionally only its first rows.
    SampledPoints { limit: Option<usize> },
    /// Random pairs of street-network nodes.
    RandomNodes,
}

pub struct RoutingPipeline<S: Storage, C: ConfigProvider, R: RouteProvider> {
    storage: S,
    config: C,
    provider: R,
    source: PairSource,
    rng: Mutex<StdRng>,
}

impl<S: Storage, C: ConfigProvider, R: RouteProvider> RoutingPipeline<S, C, R> {
    pub fn new(storage: S, config: C, provider: R, source: PairSource) -> Self {
        let rng = make_rng(config.sampling().seed);
        Self {
            storage,
            config,
            provider,
            source,
            rng: Mutex::new(rng),
        }
    }

    fn routes_file(&self) -> String {
        let output = self.config.output();
        let template = match self.source {
            PairSource::SampledPoints { .. } => &output.survey_routes_file,
            PairSource::RandomNodes => &output.random_routes_file,
        };
        output.resolve(template)
    }

    fn geometry_prefix(&self) -> String {
        let output = self.config.output();
        let prefix = match self.source {
            PairSource::SampledPoints { .. } => &output.survey_route_prefix,
            PairSource::RandomNodes => &output.random_route_prefix,
        };
        format!("{}{}", prefix, output.file_suffix())
    }

    async fn random_pairs(&self) -> Result<Vec<SampledPair>> {
        let random = self.config.random_pairs();

        if let Some(previous) = &random.reuse_points {
            let previous = self.config.output().resolve(previous);
            if self.storage.exists(&previous).await {
                tracing::info!("Reading previously drawn {} points from {}", random.count, previous);
                let bytes = self.storage.read_file(&previous).await?;
                let pairs = read_points(&bytes, Some(random.count))?;
                if pairs.len() < random.count {
                    tracing::warn!(
                        "⚠️ {} holds only {} of the {} requested pairs",
                        previous,
                        pairs.len(),
                        random.count
                    );
                }
                return Ok(pairs);
            }
            tracing::info!("{} does not exist yet, drawing new pairs", previous);
        }

        tracing::info!("Selecting {} random node pairs from {}", random.count, random.nodes_path);
        let bytes = self.storage.read_file(&random.nodes_path).await?;
        let nodes = read_nodes(&bytes)?;

        let pairs = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| EtlError::processing("sampling RNG lock poisoned"))?;
            draw_node_pairs(&mut *rng, &nodes, random.count)?
        };

        Ok(pairs
            .into_iter()
            .map(|pair| SampledPair {
                pair,
                attributes: None,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, R: RouteProvider> Pipeline for RoutingPipeline<S, C, R> {
    type Extracted = Vec<SampledPair>;
    type Transformed = RouteBatchResult;

    async fn extract(&self) -> Result<Vec<SampledPair>> {
        match self.source {
            PairSource::SampledPoints { limit } => {
                let path = &self.config.output().points_file;
                tracing::info!("Reading previously sampled points from {}", path);
                let bytes = self.storage.read_file(path).await?;
                read_points(&bytes, limit)
            }
            PairSource::RandomNodes => self.random_pairs().await,
        }
    }

    async fn transform(&self, data: Vec<SampledPair>) -> Result<RouteBatchResult> {
        let routing = self.config.routing();
        tracing::info!(
            "Routing {} pairs x {} profiles via {}",
            data.len(),
            routing.profiles.len(),
            routing.base_url
        );

        let result = RouteBatch::new(&self.provider, &self.storage, &routing.profiles)
            .with_route_files(self.config.output().route_dir.clone(), self.geometry_prefix())
            .with_progress_interval(self.config.progress_interval())
            .run(data)
            .await?;

        tracing::info!(
            "✅ {} routes computed, {} calls skipped",
            result.routed_calls,
            result.skipped_calls
        );
        Ok(result)
    }

    async fn load(&self, result: RouteBatchResult) -> Result<String> {
        let path = self.routes_file();
        let bytes = write_routes(&result)?;

        tracing::debug!("Writing {} route rows ({} bytes) to {}", result.rows.len(), bytes.len(), path);
        self.storage.write_file(&path, &bytes).await?;
        Ok(path)
    }
}
