pub mod point_sampling;
pub mod routing_pipeline;

pub use point_sampling::PointSamplingPipeline;
pub use routing_pipeline::{PairSource, RoutingPipeline};
