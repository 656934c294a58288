use crate::core::sampling::{make_rng, sample_pairs};
use crate::core::survey::read_survey;
use crate::core::tables::write_points;
use crate::core::zones::ZoneIndex;
use crate::domain::model::{SampledPair, SurveyTrip};
use crate::domain::ports::{Batch, ConfigProvider, Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use rand::rngs::StdRng;
use std::sync::Mutex;

/// Survey trips together with the zones they refer to.
pub struct SamplingInput {
    pub trips: Vec<SurveyTrip>,
    pub zones: ZoneIndex,
}

impl Batch for SamplingInput {
    fn record_count(&self) -> usize {
        self.trips.len()
    }
}

/// Survey CSV + zone polygons -> sampled origin/destination points CSV.
pub struct PointSamplingPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    rng: Mutex<StdRng>,
}

impl<S: Storage, C: ConfigProvider> PointSamplingPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let rng = make_rng(config.sampling().seed);
        Self {
            storage,
            config,
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PointSamplingPipeline<S, C> {
    type Extracted = SamplingInput;
    type Transformed = Vec<SampledPair>;

    async fn extract(&self) -> Result<SamplingInput> {
        let survey = self.config.survey();
        tracing::debug!("Reading survey trips from {}", survey.path);
        let bytes = self.storage.read_file(&survey.path).await?;
        let trips = read_survey(&bytes, survey)?;

        let zones_config = self.config.zones();
        tracing::debug!("Reading zone polygons from {}", zones_config.path);
        let raw = self.storage.read_file(&zones_config.path).await?;
        let raw = String::from_utf8(raw)
            .map_err(|e| EtlError::processing(format!("{} is not UTF-8: {}", zones_config.path, e)))?;
        let zones = ZoneIndex::from_geojson_str(&raw, &zones_config.code_property)?;

        tracing::info!("Loaded {} survey trips and {} zones", trips.len(), zones.len());
        Ok(SamplingInput { trips, zones })
    }

    async fn transform(&self, data: SamplingInput) -> Result<Vec<SampledPair>> {
        let sampling = self.config.sampling();
        let per_trip = sampling.points_per_zone;
        let total = data.trips.len() * per_trip;
        let progress_interval = self.config.progress_interval().max(1);

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| EtlError::processing("sampling RNG lock poisoned"))?;

        let mut samples = Vec::with_capacity(total);
        let mut skipped = 0;
        for (i, trip) in data.trips.iter().enumerate() {
            let zones = data
                .zones
                .require(trip.origin_zone)
                .and_then(|origin| Ok((origin, data.zones.require(trip.destination_zone)?)));
            let (origin, destination) = match zones {
                Ok(zones) => zones,
                Err(e @ EtlError::ZoneNotFound { .. }) if sampling.skip_missing_zones => {
                    tracing::warn!("⚠️ Trip {} skipped: {}", i, e);
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let pairs = sample_pairs(&mut *rng, origin, destination, per_trip, sampling.max_attempts)?;
            samples.extend(pairs.into_iter().map(|pair| SampledPair {
                pair,
                attributes: Some(trip.attributes.clone()),
            }));

            if (i + 1) % progress_interval == 0 {
                tracing::info!("Generating random points: {}/{}", samples.len(), total);
            }
        }

        if skipped > 0 {
            tracing::warn!("{} trips skipped because a zone was missing", skipped);
        }
        Ok(samples)
    }

    async fn load(&self, result: Vec<SampledPair>) -> Result<String> {
        let path = &self.config.output().points_file;
        let bytes = write_points(&result)?;

        tracing::debug!("Writing {} sampled pairs ({} bytes) to {}", result.len(), bytes.len(), path);
        self.storage.write_file(path, &bytes).await?;
        Ok(path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobConfig;
    use crate::core::tables::read_points;
    use geo::Intersects;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<AsyncMutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &str) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }
    }

    const SURVEY: &str = "\
DTCC_or11;FR_or11;Sec_or11;SS_or11;DTCC_de11;FR_de11;Sec_de11;SS_de11;Tipo_veiculo_2;Dia_da_semana;PESOFIN
1106;1;1;1;1106;2;3;5;Walking;2;12,5
1106;2;3;5;1106;1;1;1;Cycling;4;3
1106;2;3;5;1106;2;3;5;Walking;4;1
1106;9;9;9;1106;2;3;5;Walking;4;1
";

    const ZONES: &str = r#"{"type": "FeatureCollection", "features": [
  {"type": "Feature", "properties": {"BGRI11": 11060100101},
   "geometry": {"type": "Polygon", "coordinates": [[[-9.15, 38.72], [-9.14, 38.72], [-9.14, 38.73], [-9.15, 38.72]]]}},
  {"type": "Feature", "properties": {"BGRI11": "11060200305"},
   "geometry": {"type": "Polygon", "coordinates": [[[-9.20, 38.70], [-9.18, 38.70], [-9.18, 38.71], [-9.20, 38.71], [-9.20, 38.70]]]}}
]}"#;

    async fn seeded_storage() -> MockStorage {
        let storage = MockStorage::default();
        let config = JobConfig::default();
        storage.put(&config.survey.path, SURVEY).await;
        storage.put(&config.zones.path, ZONES).await;
        storage
    }

    fn config(skip_missing: bool) -> JobConfig {
        let mut config = JobConfig::default();
        config.sampling.points_per_zone = 3;
        config.sampling.seed = Some(2011);
        config.sampling.skip_missing_zones = skip_missing;
        config
    }

    #[tokio::test]
    async fn test_row_count_is_trips_times_points_per_zone() {
        let storage = seeded_storage().await;
        let pipeline = PointSamplingPipeline::new(storage.clone(), config(true));

        let input = pipeline.extract().await.unwrap();
        assert_eq!(input.trips.len(), 4);

        let zones = input.zones.clone();
        let samples = pipeline.transform(input).await.unwrap();
        // the trip pointing at zone 11060900909 is skipped
        assert_eq!(samples.len(), 3 * 3);

        let origin = zones.get(11060100101).unwrap();
        let destination = zones.get(11060200305).unwrap();
        for sample in &samples[..3] {
            assert!(origin.geometry.intersects(&geo::Point::from(sample.pair.origin)));
            assert!(destination.geometry.intersects(&geo::Point::from(sample.pair.destination)));
            assert_eq!(sample.attributes.as_ref().unwrap().vehicle, "Walking");
        }

        let path = pipeline.load(samples).await.unwrap();
        assert_eq!(path, "data/imob_generated_points.csv");
        let written = storage.get_file(&path).await.unwrap();
        assert_eq!(read_points(&written, None).unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_missing_zone_is_fatal_by_default() {
        let storage = seeded_storage().await;
        let pipeline = PointSamplingPipeline::new(storage, config(false));

        let input = pipeline.extract().await.unwrap();
        let err = pipeline.transform(input).await.unwrap_err();
        assert!(matches!(err, EtlError::ZoneNotFound { code: 11060900909 }));
    }

    #[tokio::test]
    async fn test_same_seed_same_points() {
        let first = {
            let pipeline = PointSamplingPipeline::new(seeded_storage().await, config(true));
            let input = pipeline.extract().await.unwrap();
            pipeline.transform(input).await.unwrap()
        };
        let second = {
            let pipeline = PointSamplingPipeline::new(seeded_storage().await, config(true));
            let input = pipeline.extract().await.unwrap();
            pipeline.transform(input).await.unwrap()
        };
        assert_eq!(first, second);
    }
}
