use crate::core::geodesy::haversine_km;
use crate::domain::model::{RouteBatchResult, RouteRow, SampledPair};
use crate::domain::ports::{Batch, RouteProvider, Storage};
use crate::utils::error::Result;
use std::time::Instant;

impl Batch for RouteBatchResult {
    fn record_count(&self) -> usize {
        self.rows.len()
    }
}

/// Sequential routing loop: every pair, every profile, one awaited call at a time.
pub struct RouteBatch<'a, R: RouteProvider, S: Storage> {
    provider: &'a R,
    storage: &'a S,
    profiles: &'a [String],
    route_dir: String,
    file_prefix: String,
    progress_interval: usize,
}

impl<'a, R: RouteProvider, S: Storage> RouteBatch<'a, R, S> {
    pub fn new(provider: &'a R, storage: &'a S, profiles: &'a [String]) -> Self {
        Self {
            provider,
            storage,
            profiles,
            route_dir: "routes".to_string(),
            file_prefix: String::new(),
            progress_interval: 100,
        }
    }

    pub fn with_route_files(mut self, route_dir: impl Into<String>, file_prefix: impl Into<String>) -> Self {
        self.route_dir = route_dir.into();
        self.file_prefix = file_prefix.into();
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    fn geometry_path(&self, index: usize, profile: &str) -> String {
        format!(
            "{}/{}_{}_{}.geojson",
            self.route_dir.trim_end_matches('/'),
            self.file_prefix,
            index,
            profile
        )
    }

    pub async fn run(&self, samples: Vec<SampledPair>) -> Result<RouteBatchResult> {
        let total = samples.len();
        let started = Instant::now();
        let mut result = RouteBatchResult {
            rows: Vec::with_capacity(total),
            profiles: self.profiles.to_vec(),
            ..Default::default()
        };

        for (index, sample) in samples.into_iter().enumerate() {
            let mut modes = Vec::with_capacity(self.profiles.len());

            for profile in self.profiles {
                match self.provider.directions(profile, &sample.pair).await {
                    Ok(response) => {
                        let path = self.geometry_path(index, profile);
                        let geojson = response.to_geojson_string()?;
                        self.storage.write_file(&path, geojson.as_bytes()).await?;

                        tracing::debug!(
                            "Pair {} {}: {:.1} m, {:.1} s",
                            index,
                            profile,
                            response.summary.distance,
                            response.summary.duration
                        );
                        modes.push(Some(response.summary));
                        result.routed_calls += 1;
                    }
                    Err(e) if e.is_skippable() => {
                        tracing::warn!("⚠️ Pair {} {} skipped: {}", index, profile, e);
                        modes.push(None);
                        result.skipped_calls += 1;
                    }
                    Err(e) => {
                        tracing::error!("❌ Pair {} {} failed, aborting batch: {}", index, profile, e);
                        return Err(e.into());
                    }
                }
            }

            result.rows.push(RouteRow {
                id: index,
                haversine_km: haversine_km(sample.pair.origin, sample.pair.destination),
                sample,
                modes,
            });

            if (index + 1) % self.progress_interval == 0 || index + 1 == total {
                tracing::info!(
                    "Routed {}/{} pairs ({} calls skipped, {:?} elapsed)",
                    index + 1,
                    total,
                    result.skipped_calls,
                    started.elapsed()
                );
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::routing::{RouteResponse, RoutingError};
    use crate::domain::model::{Coordinate, PointPair};
    use crate::utils::error::EtlError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
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

    /// Answers every profile except the ones listed in `failing`.
    struct ScriptedProvider {
        failing: Vec<&'static str>,
        unreachable: bool,
    }

    #[async_trait]
    impl RouteProvider for ScriptedProvider {
        async fn directions(
            &self,
            profile: &str,
            pair: &PointPair,
        ) -> std::result::Result<RouteResponse, RoutingError> {
            if self.unreachable {
                let e = reqwest::Client::new()
                    .get("http://[::1]:1/unreachable")
                    .send()
                    .await
                    .unwrap_err();
                return Err(RoutingError::Transport(e));
            }
            if self.failing.contains(&profile) {
                return Err(RoutingError::Api {
                    status: 404,
                    message: "Could not find routable point".to_string(),
                });
            }
            let body = serde_json::json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": { "summary": { "distance": 1000.0, "duration": 120.0 } },
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [
                            [pair.origin.lon, pair.origin.lat],
                            [pair.destination.lon, pair.destination.lat]
                        ]
                    }
                }]
            });
            RouteResponse::parse(&body.to_string())
        }
    }

    fn samples(n: usize) -> Vec<SampledPair> {
        (0..n)
            .map(|i| SampledPair {
                pair: PointPair::new(
                    Coordinate::new(-9.15 + i as f64 * 0.001, 38.72),
                    Coordinate::new(-9.14, 38.75),
                ),
                attributes: None,
            })
            .collect()
    }

    fn profiles() -> Vec<String> {
        vec!["driving-car".to_string(), "foot-walking".to_string(), "cycling-regular".to_string()]
    }

    #[tokio::test]
    async fn test_failed_profile_only_empties_its_own_cells() {
        let provider = ScriptedProvider {
            failing: vec!["foot-walking"],
            unreachable: false,
        };
        let storage = MockStorage::default();
        let profiles = profiles();

        let result = RouteBatch::new(&provider, &storage, &profiles)
            .with_route_files("routes", "imob_2020")
            .run(samples(3))
            .await
            .unwrap();

        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.routed_calls, 6);
        assert_eq!(result.skipped_calls, 3);
        for row in &result.rows {
            assert!(row.modes[0].is_some());
            assert!(row.modes[1].is_none());
            assert!(row.modes[2].is_some());
            assert!(row.haversine_km > 0.0);
        }

        // geometry lives on disk only, one file per routed call
        let files = storage.files.lock().await;
        assert_eq!(files.len(), result.routed_calls);
        assert!(files.contains_key("routes/imob_2020_2_cycling-regular.geojson"));
        assert!(!files.contains_key("routes/imob_2020_0_foot-walking.geojson"));
    }

    #[tokio::test]
    async fn test_unreachable_server_aborts_batch() {
        let provider = ScriptedProvider {
            failing: vec![],
            unreachable: true,
        };
        let storage = MockStorage::default();
        let profiles = profiles();

        let err = RouteBatch::new(&provider, &storage, &profiles)
            .run(samples(2))
            .await
            .unwrap_err();

        assert!(matches!(err, EtlError::Routing(RoutingError::Transport(_))));
    }
}
