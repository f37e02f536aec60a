//! Configuration loading with environment variable substitution.

use crate::types::AttestorConfig;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("configuration file missing: {0}")]
	FileNotFound(String),

	#[error("configuration is not valid TOML: {0}")]
	ParseError(String),

	#[error("rejected configuration: {0}")]
	ValidationError(String),

	#[error("placeholder references unset environment variable {0}")]
	EnvVarNotFound(String),

	#[error("failed reading configuration: {0}")]
	IoError(#[from] std::io::Error),
}

/// Loads TOML configuration, substitutes `${VAR}` placeholders from the
/// environment, applies prefixed env overrides, and validates the result.
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "ATTESTOR_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<AttestorConfig, ConfigError> {
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		self.apply_env_overrides(&mut config);

		Self::validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<AttestorConfig, ConfigError> {
		let content = tokio::fs::read_to_string(file_path).await?;

		let substituted_content = self.substitute_env_vars(&content)?;

		let config: AttestorConfig = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut AttestorConfig) {
		if let Ok(url) = env::var(format!("{}VERIFIER_URL", self.env_prefix)) {
			debug!("Overriding verifier URL from environment");
			config.verifier.url = url;
		}

		if let Ok(key) = env::var(format!("{}API_KEY", self.env_prefix)) {
			debug!("Overriding verifier API key from environment");
			config.verifier.api_key = key;
		}

		if let Ok(url) = env::var(format!("{}SUBMISSION_URL", self.env_prefix)) {
			debug!("Overriding submission URL from environment");
			config.submission.url = url;
		}

		if let Ok(url) = env::var(format!("{}DA_LAYER_URL", self.env_prefix)) {
			debug!("Overriding data-availability URL from environment");
			config.da_layer.url = url;
		}
	}

	fn validate_config(config: &AttestorConfig) -> Result<(), ConfigError> {
		for (name, url) in [
			("verifier.url", &config.verifier.url),
			("submission.url", &config.submission.url),
			("da_layer.url", &config.da_layer.url),
		] {
			if !url.starts_with("http://") && !url.starts_with("https://") {
				return Err(ConfigError::ValidationError(format!(
					"{} must start with http:// or https://",
					name
				)));
			}
		}

		if config.verifier.api_key.is_empty() {
			return Err(ConfigError::ValidationError(
				"verifier.api_key must not be empty".to_string(),
			));
		}

		if config.retry.max_attempts < 1 {
			return Err(ConfigError::ValidationError(
				"retry.max_attempts must be at least 1".to_string(),
			));
		}

		if let Some(multiplier) = config.retry.backoff_multiplier {
			// Rejects NaN as well; contains is false for it.
			if !(1.0..=100.0).contains(&multiplier) {
				return Err(ConfigError::ValidationError(
					"retry.backoff_multiplier must be between 1.0 and 100.0".to_string(),
				));
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const VALID_TOML: &str = r#"
deadline_secs = 120

[verifier]
url = "https://verifier.example/"
api_key = "test-key"

[submission]
url = "https://submission.example/"

[da_layer]
url = "https://da.example/"

[retry]
max_attempts = 4
delay_ms = 500
backoff_multiplier = 2.0
"#;

	#[tokio::test]
	async fn test_load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(VALID_TOML.as_bytes()).unwrap();

		let config = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap();

		assert_eq!(config.verifier.api_key, "test-key");
		assert_eq!(config.retry.max_attempts, 4);
		assert_eq!(config.retry.backoff_multiplier, Some(2.0));
		assert_eq!(config.deadline_secs, Some(120));
	}

	#[tokio::test]
	async fn test_env_substitution() {
		env::set_var("ATTESTOR_TEST_SUBST_KEY", "secret-from-env");

		let toml = r#"
[verifier]
url = "https://verifier.example/"
api_key = "${ATTESTOR_TEST_SUBST_KEY}"

[submission]
url = "https://submission.example/"

[da_layer]
url = "https://da.example/"
"#;
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(toml.as_bytes()).unwrap();

		let config = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap();
		assert_eq!(config.verifier.api_key, "secret-from-env");
	}

	#[tokio::test]
	async fn test_missing_env_var_is_an_error() {
		let toml = r#"
[verifier]
url = "https://verifier.example/"
api_key = "${ATTESTOR_TEST_DEFINITELY_UNSET}"

[submission]
url = "https://submission.example/"

[da_layer]
url = "https://da.example/"
"#;
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(toml.as_bytes()).unwrap();

		let err = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap_err();
		assert!(matches!(err, ConfigError::EnvVarNotFound(_)));
	}

	#[tokio::test]
	async fn test_validation_rejects_zero_attempts() {
		let toml = r#"
[verifier]
url = "https://verifier.example/"
api_key = "k"

[submission]
url = "https://submission.example/"

[da_layer]
url = "https://da.example/"

[retry]
max_attempts = 0
delay_ms = 500
"#;
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(toml.as_bytes()).unwrap();

		let err = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap_err();
		assert!(err.to_string().contains("max_attempts"));
	}

	#[tokio::test]
	async fn test_validation_rejects_runaway_multiplier() {
		let toml = r#"
[verifier]
url = "https://verifier.example/"
api_key = "k"

[submission]
url = "https://submission.example/"

[da_layer]
url = "https://da.example/"

[retry]
max_attempts = 4
delay_ms = 500
backoff_multiplier = 1e300
"#;
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(toml.as_bytes()).unwrap();

		let err = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap_err();
		assert!(err.to_string().contains("backoff_multiplier"));
	}

	#[tokio::test]
	async fn test_validation_rejects_bad_url() {
		let toml = r#"
[verifier]
url = "ftp://verifier.example/"
api_key = "k"

[submission]
url = "https://submission.example/"

[da_layer]
url = "https://da.example/"
"#;
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(toml.as_bytes()).unwrap();

		let err = ConfigLoader::new()
			.with_file(file.path())
			.load()
			.await
			.unwrap_err();
		assert!(err.to_string().contains("verifier.url"));
	}

	#[test]
	fn test_defaults_fill_feeds_and_retry() {
		let config: AttestorConfig = toml::from_str(
			r#"
[verifier]
url = "https://verifier.example/"
api_key = "k"

[submission]
url = "https://submission.example/"

[da_layer]
url = "https://da.example/"
"#,
		)
		.unwrap();

		assert_eq!(config.retry.max_attempts, 10);
		assert!(config.feeds.price.url.contains("coingecko"));
		assert_eq!(config.feeds.inventory.layout().fields.len(), 2);
	}
}
