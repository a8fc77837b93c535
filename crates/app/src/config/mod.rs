use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use usage_core::Granularity;

use crate::error::{AppError, Result};

pub const DEFAULT_API_URL: &str = "https://console.neon.tech/api/v2";
pub const DEFAULT_ENV_FILE: &str = ".env";

pub const API_KEY_VAR: &str = "NEON_API_KEY";
pub const ORG_ID_VAR: &str = "NEON_ORG_ID";
pub const API_URL_VAR: &str = "NEON_API_URL";
pub const GRANULARITY_VAR: &str = "NEON_USAGE_GRANULARITY";
pub const ACTIVE_ONLY_VAR: &str = "NEON_USAGE_ACTIVE_ONLY";
pub const PRICING_VAR: &str = "NEON_USAGE_PRICING";

/// Values given on the command line. `None` means "not given".
#[derive(Clone, Debug, Default)]
pub struct CliOverrides {
    pub org_id: Option<String>,
    pub api_url: Option<String>,
    pub granularity: Option<String>,
    pub active_only: Option<bool>,
    pub pricing_path: Option<PathBuf>,
}

/// Raw inputs to configuration resolution, highest precedence first.
#[derive(Clone, Debug, Default)]
pub struct ConfigSources {
    pub cli: CliOverrides,
    pub env: HashMap<String, String>,
    pub dotenv: HashMap<String, String>,
}

impl ConfigSources {
    fn lookup(&self, key: &str) -> Option<String> {
        [&self.env, &self.dotenv].into_iter().find_map(|vars| {
            vars.get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        })
    }

    fn pick(&self, cli: Option<&String>, key: &str) -> Option<String> {
        cli.map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| self.lookup(key))
    }
}

/// Validated settings for one run.
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub org_id: Option<String>,
    pub api_url: String,
    pub granularity: Granularity,
    pub active_only: bool,
    pub pricing_path: Option<PathBuf>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("org_id", &self.org_id)
            .field("api_url", &self.api_url)
            .field("granularity", &self.granularity)
            .field("active_only", &self.active_only)
            .field("pricing_path", &self.pricing_path)
            .finish()
    }
}

/// Resolves settings with precedence CLI > process environment > env file.
pub fn resolve(sources: &ConfigSources) -> Result<Settings> {
    let api_key = sources.lookup(API_KEY_VAR).ok_or_else(|| {
        AppError::Config(format!(
            "{API_KEY_VAR} is not set. Get an API key from https://console.neon.tech/app/settings/api-keys"
        ))
    })?;

    let org_id = sources.pick(sources.cli.org_id.as_ref(), ORG_ID_VAR);
    let api_url = sources
        .pick(sources.cli.api_url.as_ref(), API_URL_VAR)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    let granularity = match sources.pick(sources.cli.granularity.as_ref(), GRANULARITY_VAR) {
        Some(value) => Granularity::parse(&value).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "unsupported granularity {value:?} (expected hourly, daily or monthly)"
            ))
        })?,
        None => Granularity::default(),
    };

    let active_only = match sources.cli.active_only {
        Some(value) => value,
        None => match sources.lookup(ACTIVE_ONLY_VAR) {
            Some(value) => parse_bool(ACTIVE_ONLY_VAR, &value)?,
            None => false,
        },
    };

    let pricing_path = sources
        .cli
        .pricing_path
        .clone()
        .or_else(|| sources.lookup(PRICING_VAR).map(PathBuf::from));

    Ok(Settings {
        api_key,
        org_id,
        api_url,
        granularity,
        active_only,
        pricing_path,
    })
}

/// Reads `KEY=value` pairs from an env file without touching the process
/// environment. A missing file yields no values.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::InvalidInput(format!(
            "{key} must be a boolean, got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::tempdir;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn cli_beats_env_beats_dotenv() {
        let sources = ConfigSources {
            cli: CliOverrides {
                org_id: Some("org-from-cli".to_string()),
                ..CliOverrides::default()
            },
            env: vars(&[
                (API_KEY_VAR, "env-key"),
                (ORG_ID_VAR, "org-from-env"),
                (GRANULARITY_VAR, "hourly"),
            ]),
            dotenv: vars(&[
                (API_KEY_VAR, "file-key"),
                (ORG_ID_VAR, "org-from-file"),
                (GRANULARITY_VAR, "monthly"),
                (ACTIVE_ONLY_VAR, "yes"),
            ]),
        };
        let settings = resolve(&sources).expect("settings");
        assert_eq!(settings.api_key, "env-key");
        assert_eq!(settings.org_id.as_deref(), Some("org-from-cli"));
        assert_eq!(settings.granularity, Granularity::Hourly);
        assert!(settings.active_only);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn blank_env_value_falls_through_to_dotenv() {
        let sources = ConfigSources {
            env: vars(&[(API_KEY_VAR, "  ")]),
            dotenv: vars(&[(API_KEY_VAR, "file-key")]),
            ..ConfigSources::default()
        };
        assert_eq!(resolve(&sources).expect("settings").api_key, "file-key");
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err = resolve(&ConfigSources::default()).expect_err("no key");
        assert!(matches!(err, AppError::Config(ref message) if message.contains(API_KEY_VAR)));
    }

    #[test]
    fn cli_flag_overrides_env_active_only() {
        let sources = ConfigSources {
            cli: CliOverrides {
                active_only: Some(false),
                granularity: Some("Daily".to_string()),
                api_url: Some("http://localhost:9000/api/v2/".to_string()),
                ..CliOverrides::default()
            },
            env: vars(&[(API_KEY_VAR, "key"), (ACTIVE_ONLY_VAR, "true")]),
            ..ConfigSources::default()
        };
        let settings = resolve(&sources).expect("settings");
        assert!(!settings.active_only);
        assert_eq!(settings.granularity, Granularity::Daily);
        assert_eq!(settings.api_url, "http://localhost:9000/api/v2");
    }

    #[test]
    fn rejects_unknown_granularity_and_bool() {
        let bad_granularity = ConfigSources {
            env: vars(&[(API_KEY_VAR, "key"), (GRANULARITY_VAR, "weekly")]),
            ..ConfigSources::default()
        };
        assert!(matches!(
            resolve(&bad_granularity),
            Err(AppError::InvalidInput(_))
        ));

        let bad_bool = ConfigSources {
            env: vars(&[(API_KEY_VAR, "key"), (ACTIVE_ONLY_VAR, "maybe")]),
            ..ConfigSources::default()
        };
        assert!(matches!(resolve(&bad_bool), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let sources = ConfigSources {
            env: vars(&[(API_KEY_VAR, "napi_secret")]),
            ..ConfigSources::default()
        };
        let settings = resolve(&sources).expect("settings");
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("napi_secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn env_file_is_read_without_touching_process_env() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "# local overrides\nNEON_USAGE_TEST_ONLY_KEY=from-file\nNEON_ORG_ID=\"org-quoted\"\n",
        )
        .expect("write env");

        let values = read_env_file(&path).expect("read env");
        assert_eq!(
            values.get("NEON_USAGE_TEST_ONLY_KEY").map(String::as_str),
            Some("from-file")
        );
        assert_eq!(values.get(ORG_ID_VAR).map(String::as_str), Some("org-quoted"));
        assert!(std::env::var("NEON_USAGE_TEST_ONLY_KEY").is_err());

        let missing = read_env_file(&dir.path().join("absent.env")).expect("missing env");
        assert!(missing.is_empty());
    }
}
