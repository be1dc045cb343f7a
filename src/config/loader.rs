use crate::config::schema::CrawlerConfig;
use crate::error::{Error, Result};
use config::{Config, Environment};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use validator::Validate;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<CrawlerConfig> {
        Self::load_with_env(path, std::env::vars().collect())
    }

    /// Same layering as [`ConfigLoader::load`] with an explicit environment.
    /// Empty variables are treated as unset.
    pub fn load_with_env(
        path: Option<&Path>,
        env: HashMap<String, String>,
    ) -> Result<CrawlerConfig> {
        let base = match path {
            Some(path) => Self::load_file(path)?,
            None => CrawlerConfig::default(),
        };

        let merged = Config::builder()
            .add_source(Config::try_from(&base)?)
            .add_source(Environment::default().source(Some(env)).ignore_empty(true))
            .build()?;

        let config: CrawlerConfig = merged.try_deserialize()?;
        config.validate()?;
        config.check_durations()?;
        Ok(config)
    }

    /// Missing fields in the file fall back to their defaults.
    fn load_file(path: &Path) -> Result<CrawlerConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ConfigLoader::load_with_env(None, HashMap::new()).unwrap();
        assert_eq!(config, CrawlerConfig::default());
        assert_eq!(config.crawl_delay_seconds, 5.0);
        assert_eq!(config.health_enqueue_max_seconds, 20.0);
        assert_eq!(config.health_worker_max_seconds, 25.0);
        assert_eq!(config.worker_pause_ms, 100);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ConfigLoader::load_with_env(
            None,
            env(&[
                ("CRAWL_URL", "https://example.org/"),
                ("CRAWL_TARGET", "football"),
                ("CRAWL_DELAY_SECONDS", "2.5"),
                ("HEALTH_WORKER_MAX_SECONDS", "40"),
                ("WORKER_PAUSE_MS", "250"),
                ("POSTGRES_DSN", "sqlite::memory:"),
                ("PATH", "/usr/bin"),
            ]),
        )
        .unwrap();

        assert_eq!(config.crawl_url, "https://example.org/");
        assert_eq!(config.crawl_target, "football");
        assert_eq!(config.crawl_delay_seconds, 2.5);
        assert_eq!(config.health_worker_max_seconds, 40.0);
        assert_eq!(config.worker_pause_ms, 250);
        assert_eq!(config.postgres_dsn, "sqlite::memory:");
        assert_eq!(config.redis_url, "redis://localhost:6379/0");
    }

    #[test]
    fn empty_variables_fall_back_to_defaults() {
        let config =
            ConfigLoader::load_with_env(None, env(&[("CRAWL_DELAY_SECONDS", "")])).unwrap();
        assert_eq!(config.crawl_delay_seconds, 5.0);
    }

    #[test]
    fn malformed_values_fail() {
        let err = ConfigLoader::load_with_env(None, env(&[("CRAWL_DELAY_SECONDS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigSource(_)));

        let err =
            ConfigLoader::load_with_env(None, env(&[("CRAWL_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = ConfigLoader::load_with_env(None, env(&[("CRAWL_DELAY_SECONDS", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn non_finite_and_huge_seconds_fail() {
        for (key, value) in [
            ("CRAWL_DELAY_SECONDS", "NaN"),
            ("CRAWL_DELAY_SECONDS", "1e300"),
            ("HEALTH_ENQUEUE_MAX_SECONDS", "inf"),
            ("HEALTH_WORKER_MAX_SECONDS", "NaN"),
            ("FETCH_TIMEOUT_SECONDS", "inf"),
        ] {
            let result = ConfigLoader::load_with_env(None, env(&[(key, value)]));
            assert!(
                matches!(result, Err(Error::Validation(_)) | Err(Error::Config(_))),
                "{}={} should be rejected, got {:?}",
                key,
                value,
                result
            );
        }
    }

    #[test]
    fn file_values_sit_below_environment() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "crawl_target: basketball").unwrap();
        writeln!(file, "crawl_delay_seconds: 10").unwrap();

        let config = ConfigLoader::load_with_env(
            Some(file.path()),
            env(&[("CRAWL_DELAY_SECONDS", "3")]),
        )
        .unwrap();

        assert_eq!(config.crawl_target, "basketball");
        assert_eq!(config.crawl_delay_seconds, 3.0);
        assert_eq!(config.crawl_url, "https://www.varzesh3.com/");
    }

    #[test]
    fn toml_and_json_files_are_supported() {
        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "health_enqueue_max_seconds = 30.0").unwrap();
        let config = ConfigLoader::load_with_env(Some(toml_file.path()), HashMap::new()).unwrap();
        assert_eq!(config.health_enqueue_max_seconds, 30.0);

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json_file, r#"{{"worker_pause_ms": 5}}"#).unwrap();
        let config = ConfigLoader::load_with_env(Some(json_file.path()), HashMap::new()).unwrap();
        assert_eq!(config.worker_pause_ms, 5);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ConfigLoader::load_with_env(Some(file.path()), HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
