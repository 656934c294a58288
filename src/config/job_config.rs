use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PROFILES: [&str; 8] = [
    "driving-car",
    "driving-hgv",
    "foot-walking",
    "foot-hiking",
    "cycling-regular",
    "cycling-road",
    "cycling-mountain",
    "cycling-electric",
];

pub const DEFAULT_EXTRA_INFO: [&str; 12] = [
    "steepness",
    "suitability",
    "surface",
    "waycategory",
    "waytype",
    "tollways",
    "traildifficulty",
    "osmid",
    "roadaccessrestrictions",
    "countryinfo",
    "green",
    "noise",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub job: JobInfo,
    pub survey: SurveyConfig,
    pub zones: ZonesConfig,
    pub sampling: SamplingConfig,
    pub random_pairs: RandomPairsConfig,
    pub routing: RoutingConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobInfo {
    pub name: String,
    pub description: Option<String>,
    /// Base directory every relative path in this file is resolved against.
    pub data_dir: String,
}

impl Default for JobInfo {
    fn default() -> Self {
        Self {
            name: "lisbon-imob".to_string(),
            description: None,
            data_dir: ".".to_string(),
        }
    }
}

/// One zero-padded piece of a composite zone code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodePart {
    pub column: String,
    pub width: usize,
}

impl CodePart {
    fn new(column: &str, width: usize) -> Self {
        Self {
            column: column.to_string(),
            width,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub path: String,
    pub delimiter: char,
    pub origin_code: Vec<CodePart>,
    pub destination_code: Vec<CodePart>,
    pub vehicle_column: String,
    pub weekday_column: String,
    pub weight_column: String,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            path: "data/TBL_viagens_OR_DE_AML.csv".to_string(),
            delimiter: ';',
            origin_code: vec![
                CodePart::new("DTCC_or11", 4),
                CodePart::new("FR_or11", 2),
                CodePart::new("Sec_or11", 3),
                CodePart::new("SS_or11", 2),
            ],
            destination_code: vec![
                CodePart::new("DTCC_de11", 4),
                CodePart::new("FR_de11", 2),
                CodePart::new("Sec_de11", 3),
                CodePart::new("SS_de11", 2),
            ],
            vehicle_column: "Tipo_veiculo_2".to_string(),
            weekday_column: "Dia_da_semana".to_string(),
            weight_column: "PESOFIN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonesConfig {
    pub path: String,
    pub code_property: String,
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            path: "data/BGRI11_LISBOA.geojson".to_string(),
            code_property: "BGRI11".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub points_per_zone: usize,
    pub max_attempts: usize,
    pub seed: Option<u64>,
    pub skip_missing_zones: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            points_per_zone: 5,
            max_attempts: 100_000,
            seed: None,
            skip_missing_zones: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomPairsConfig {
    pub nodes_path: String,
    pub count: usize,
    /// A points file drawn by an earlier run; used instead of drawing when it exists.
    pub reuse_points: Option<String>,
}

impl Default for RandomPairsConfig {
    fn default() -> Self {
        Self {
            nodes_path: "data/Lisbon_node_list_simplified.csv".to_string(),
            count: 100_000,
            reuse_points: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub profiles: Vec<String>,
    pub extra_info: Vec<String>,
    pub timeout_seconds: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/ors".to_string(),
            api_key: None,
            profiles: DEFAULT_PROFILES.iter().map(|p| p.to_string()).collect(),
            extra_info: DEFAULT_EXTRA_INFO.iter().map(|p| p.to_string()).collect(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub points_file: String,
    pub survey_routes_file: String,
    pub random_routes_file: String,
    pub route_dir: String,
    pub survey_route_prefix: String,
    pub random_route_prefix: String,
    pub file_suffix: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            points_file: "data/imob_generated_points.csv".to_string(),
            survey_routes_file: "data/dist_time_lisbon_imob_{suffix}.csv".to_string(),
            random_routes_file: "data/dist_time_lisbon_{suffix}.csv".to_string(),
            route_dir: "routes".to_string(),
            survey_route_prefix: "imob_".to_string(),
            random_route_prefix: String::new(),
            file_suffix: None,
        }
    }
}

impl OutputConfig {
    /// File name suffix; the current year when unset.
    pub fn file_suffix(&self) -> String {
        self.file_suffix
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y").to_string())
    }

    /// Replaces `{suffix}` in a path template.
    pub fn resolve(&self, template: &str) -> String {
        template.replace("{suffix}", &self.file_suffix())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub progress_interval: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            progress_interval: 100,
        }
    }
}

impl JobConfig {
    /// Loads a job from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses a job from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ORS_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Checks paths, counts, URL and profiles.
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("job.data_dir", &self.job.data_dir)?;

        validation::validate_path("survey.path", &self.survey.path)?;
        validation::validate_file_extension("survey.path", &self.survey.path, &["csv", "txt"])?;
        if self.survey.origin_code.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "survey.origin_code".to_string(),
            });
        }
        if self.survey.destination_code.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "survey.destination_code".to_string(),
            });
        }
        for part in self.survey.origin_code.iter().chain(&self.survey.destination_code) {
            validation::validate_non_empty_string("survey.*_code.column", &part.column)?;
            validation::validate_range("survey.*_code.width", part.width, 1, 12)?;
        }

        validation::validate_path("zones.path", &self.zones.path)?;
        validation::validate_file_extension("zones.path", &self.zones.path, &["geojson", "json"])?;
        validation::validate_non_empty_string("zones.code_property", &self.zones.code_property)?;

        validation::validate_positive_number(
            "sampling.points_per_zone",
            self.sampling.points_per_zone,
            1,
        )?;
        validation::validate_positive_number("sampling.max_attempts", self.sampling.max_attempts, 1)?;

        validation::validate_path("random_pairs.nodes_path", &self.random_pairs.nodes_path)?;
        validation::validate_positive_number("random_pairs.count", self.random_pairs.count, 1)?;

        validation::validate_url("routing.base_url", &self.routing.base_url)?;
        validation::validate_profiles("routing.profiles", &self.routing.profiles)?;
        validation::validate_range("routing.timeout_seconds", self.routing.timeout_seconds, 1, 3600)?;

        validation::validate_path("output.points_file", &self.output.points_file)?;
        validation::validate_file_extension("output.points_file", &self.output.points_file, &["csv"])?;
        validation::validate_path("output.survey_routes_file", &self.output.survey_routes_file)?;
        validation::validate_path("output.random_routes_file", &self.output.random_routes_file)?;
        validation::validate_path("output.route_dir", &self.output.route_dir)?;

        validation::validate_positive_number(
            "logging.progress_interval",
            self.logging.progress_interval,
            1,
        )?;

        Ok(())
    }
}

impl ConfigProvider for JobConfig {
    fn survey(&self) -> &SurveyConfig {
        &self.survey
    }

    fn zones(&self) -> &ZonesConfig {
        &self.zones
    }

    fn sampling(&self) -> &SamplingConfig {
        &self.sampling
    }

    fn random_pairs(&self) -> &RandomPairsConfig {
        &self.random_pairs
    }

    fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    fn output(&self) -> &OutputConfig {
        &self.output
    }

    fn progress_interval(&self) -> usize {
        self.logging.progress_interval
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = JobConfig::from_toml_str("").unwrap();

        assert_eq!(config.sampling.points_per_zone, 5);
        assert_eq!(config.routing.profiles.len(), 8);
        assert_eq!(config.routing.profiles[0], "driving-car");
        assert_eq!(config.survey.delimiter, ';');
        assert_eq!(config.survey.origin_code.len(), 4);
        assert_eq!(config.zones.code_property, "BGRI11");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_job_toml() {
        let toml_content = r#"
[job]
name = "porto"
data_dir = "/tmp/porto"

[survey]
path = "trips.csv"
delimiter = ","
origin_code = [{ column = "zone_or", width = 6 }]
destination_code = [{ column = "zone_de", width = 6 }]

[sampling]
points_per_zone = 3
seed = 42

[routing]
base_url = "https://api.openrouteservice.org"
profiles = ["driving-car", "foot-walking"]

[output]
file_suffix = "2021"
"#;

        let config = JobConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.job.name, "porto");
        assert_eq!(config.survey.delimiter, ',');
        assert_eq!(config.survey.origin_code[0].width, 6);
        assert_eq!(config.sampling.seed, Some(42));
        assert_eq!(config.routing.profiles, vec!["driving-car", "foot-walking"]);
        // untouched fields keep their defaults
        assert_eq!(config.routing.timeout_seconds, 30);
        assert_eq!(
            config.output.resolve(&config.output.survey_routes_file),
            "data/dist_time_lisbon_imob_2021.csv"
        );
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ODROUTE_TEST_ORS_KEY", "secret-key");

        let toml_content = r#"
[routing]
api_key = "${ODROUTE_TEST_ORS_KEY}"
"#;

        let config = JobConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.routing.api_key.as_deref(), Some("secret-key"));

        std::env::remove_var("ODROUTE_TEST_ORS_KEY");
    }

    #[test]
    fn test_config_validation() {
        let invalid_url = JobConfig::from_toml_str("[routing]\nbase_url = \"invalid-url\"\n").unwrap();
        assert!(invalid_url.validate().is_err());

        let no_profiles = JobConfig::from_toml_str("[routing]\nprofiles = []\n").unwrap();
        assert!(no_profiles.validate().is_err());

        let zero_points = JobConfig::from_toml_str("[sampling]\npoints_per_zone = 0\n").unwrap();
        assert!(zero_points.validate().is_err());

        let shapefile = JobConfig::from_toml_str("[zones]\npath = \"zones.shp\"\n").unwrap();
        assert!(shapefile.validate().is_err());
    }

    #[test]
    fn test_default_suffix_is_current_year() {
        let output = OutputConfig::default();
        let year = chrono::Local::now().format("%Y").to_string();
        assert_eq!(output.file_suffix(), year);
        assert_eq!(
            output.resolve("dist_time_{suffix}.csv"),
            format!("dist_time_{}.csv", year)
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[job]
name = "file-test"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = JobConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.job.name, "file-test");
    }
}
