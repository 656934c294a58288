use crate::config::job_config::{
    OutputConfig, RandomPairsConfig, RoutingConfig, SamplingConfig, SurveyConfig, ZonesConfig,
};
use crate::core::routing::{RouteResponse, RoutingError};
use crate::domain::model::PointPair;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn survey(&self) -> &SurveyConfig;
    fn zones(&self) -> &ZonesConfig;
    fn sampling(&self) -> &SamplingConfig;
    fn random_pairs(&self) -> &RandomPairsConfig;
    fn routing(&self) -> &RoutingConfig;
    fn output(&self) -> &OutputConfig;
    fn progress_interval(&self) -> usize;
}

/// Anything a pipeline stage hands to the next one; the engine only needs a count to log.
pub trait Batch {
    fn record_count(&self) -> usize;
}

impl<T> Batch for Vec<T> {
    fn record_count(&self) -> usize {
        self.len()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Batch + Send;
    type Transformed: Batch + Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}

/// A routing backend answering one origin/destination query for one travel-mode profile.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn directions(
        &self,
        profile: &str,
        pair: &PointPair,
    ) -> std::result::Result<RouteResponse, RoutingError>;
}
