pub mod batch;
pub mod etl;
pub mod geodesy;
pub mod random_pairs;
pub mod routing;
pub mod sampling;
pub mod survey;
pub mod tables;
pub mod zones;

pub use crate::domain::model::{PointPair, RouteBatchResult, SampledPair};
pub use crate::domain::ports::{Batch, ConfigProvider, Pipeline, RouteProvider, Storage};
pub use crate::utils::error::Result;
