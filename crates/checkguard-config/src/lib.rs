use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "checkguard";
const CONFIG_FILENAME: &str = "config.toml";

pub const ENV_DB_PATH: &str = "CHECKGUARD_DB_PATH";
pub const ENV_DB_MAX_CONNECTIONS: &str = "CHECKGUARD_DB_MAX_CONNECTIONS";
pub const ENV_DB_MAX_LIFETIME_SECS: &str = "CHECKGUARD_DB_MAX_LIFETIME_SECS";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;
pub const DEFAULT_MIN_IDLE: u32 = 5;
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 300;
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Overrides the default data-dir location when set.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub min_idle: u32,
    pub max_lifetime_secs: u64,
    pub connection_timeout_secs: u64,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_idle: DEFAULT_MIN_IDLE,
            max_lifetime_secs: DEFAULT_MAX_LIFETIME_SECS,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid database.path value: {0}")]
    InvalidDatabasePath(PathBuf),
    #[error("invalid database.max_connections value: {0}")]
    InvalidMaxConnections(u32),
    #[error("database.min_idle ({min_idle}) exceeds database.max_connections ({max_connections})")]
    InvalidMinIdle { min_idle: u32, max_connections: u32 },
    #[error("invalid database.{field} value: must be greater than zero")]
    InvalidTimeout { field: &'static str },
    #[error("invalid value for {key}: {value}")]
    InvalidEnvValue { key: &'static str, value: String },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    database: Option<DatabaseFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseFile {
    path: Option<PathBuf>,
    max_connections: Option<u32>,
    min_idle: Option<u32>,
    max_lifetime_secs: Option<u64>,
    connection_timeout_secs: Option<u64>,
    busy_timeout_ms: Option<u64>,
}

/// Loads the config file (if any), then applies `CHECKGUARD_*` overrides.
pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => Some(path),
        Err(ConfigError::MissingHomeDir) if !required => None,
        Err(ConfigError::InvalidConfigPath(_)) if !required => None,
        Err(err) => return Err(err),
    };
    let parsed = match path {
        Some(path) => load_at_path(&path, required)?,
        None => None,
    };
    build_config(parsed.unwrap_or_default(), |key| env::var(key).ok())
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(parsed))
}

/// File values, then env overrides. An unset `min_idle` follows a smaller
/// `max_connections` down instead of failing validation.
fn build_config<F>(parsed: ConfigFile, lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit_min_idle = parsed
        .database
        .as_ref()
        .is_some_and(|database| database.min_idle.is_some());
    let mut config = merge_config(parsed)?;
    apply_env_overrides(&mut config, lookup)?;
    if !explicit_min_idle {
        let database = &mut config.database;
        database.min_idle = database.min_idle.min(database.max_connections);
    }
    validate(&config)?;
    Ok(config)
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(database) = parsed.database {
        if let Some(path) = database.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidDatabasePath(path));
            }
            config.database.path = Some(path);
        }
        if let Some(max_connections) = database.max_connections {
            config.database.max_connections = max_connections;
        }
        if let Some(min_idle) = database.min_idle {
            config.database.min_idle = min_idle;
        }
        if let Some(secs) = database.max_lifetime_secs {
            config.database.max_lifetime_secs = secs;
        }
        if let Some(secs) = database.connection_timeout_secs {
            config.database.connection_timeout_secs = secs;
        }
        if let Some(ms) = database.busy_timeout_ms {
            config.database.busy_timeout_ms = ms;
        }
    }

    Ok(config)
}

fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_DB_PATH).filter(|value| !value.trim().is_empty()) {
        config.database.path = Some(PathBuf::from(path));
    }
    if let Some(raw) = lookup(ENV_DB_MAX_CONNECTIONS) {
        config.database.max_connections = parse_env(ENV_DB_MAX_CONNECTIONS, &raw)?;
    }
    if let Some(raw) = lookup(ENV_DB_MAX_LIFETIME_SECS) {
        config.database.max_lifetime_secs = parse_env(ENV_DB_MAX_LIFETIME_SECS, &raw)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnvValue {
        key,
        value: raw.to_string(),
    })
}

fn validate(config: &AppConfig) -> Result<()> {
    let db = &config.database;
    if db.max_connections == 0 {
        return Err(ConfigError::InvalidMaxConnections(db.max_connections));
    }
    if db.min_idle > db.max_connections {
        return Err(ConfigError::InvalidMinIdle {
            min_idle: db.min_idle,
            max_connections: db.max_connections,
        });
    }
    if db.max_lifetime_secs == 0 {
        return Err(ConfigError::InvalidTimeout {
            field: "max_lifetime_secs",
        });
    }
    if db.connection_timeout_secs == 0 {
        return Err(ConfigError::InvalidTimeout {
            field: "connection_timeout_secs",
        });
    }
    if db.busy_timeout_ms == 0 {
        return Err(ConfigError::InvalidTimeout {
            field: "busy_timeout_ms",
        });
    }
    Ok(())
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        apply_env_overrides, build_config, load_at_path, merge_config, validate, AppConfig,
        ConfigError, ConfigFile, DatabaseFile, ENV_DB_MAX_CONNECTIONS, ENV_DB_PATH,
    };
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn restrict_permissions(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path).expect("metadata").permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).expect("chmod");
        }
    }

    #[test]
    fn defaults_match_pool_limits() {
        let config = AppConfig::default();
        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.database.min_idle, 5);
        assert_eq!(config.database.max_lifetime_secs, 300);
        assert!(config.database.path.is_none());
        validate(&config).expect("defaults are valid");
    }

    #[test]
    fn merge_config_applies_values() {
        let parsed = ConfigFile {
            database: Some(DatabaseFile {
                path: Some(PathBuf::from("/srv/checkguard/db.sqlite3")),
                max_connections: Some(8),
                min_idle: Some(2),
                max_lifetime_secs: Some(60),
                connection_timeout_secs: None,
                busy_timeout_ms: Some(250),
            }),
        };
        let merged = merge_config(parsed).expect("merge");
        assert_eq!(
            merged.database.path,
            Some(PathBuf::from("/srv/checkguard/db.sqlite3"))
        );
        assert_eq!(merged.database.max_connections, 8);
        assert_eq!(merged.database.min_idle, 2);
        assert_eq!(merged.database.max_lifetime_secs, 60);
        assert_eq!(merged.database.connection_timeout_secs, 5);
        assert_eq!(merged.database.busy_timeout_ms, 250);
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            ENV_DB_PATH => Some("/tmp/blocklist.sqlite3".to_string()),
            ENV_DB_MAX_CONNECTIONS => Some(" 3 ".to_string()),
            _ => None,
        })
        .expect("overrides");
        assert_eq!(
            config.database.path,
            Some(PathBuf::from("/tmp/blocklist.sqlite3"))
        );
        assert_eq!(config.database.max_connections, 3);
    }

    #[test]
    fn small_env_pool_lowers_default_min_idle() {
        for max in 1..=4u32 {
            let config = build_config(ConfigFile::default(), |key| {
                (key == ENV_DB_MAX_CONNECTIONS).then(|| format!(" {max} "))
            })
            .expect("valid config");
            assert_eq!(config.database.max_connections, max);
            assert_eq!(config.database.min_idle, max);
        }

        let config = build_config(ConfigFile::default(), |_| None).expect("defaults");
        assert_eq!(config.database.min_idle, 5);
    }

    #[test]
    fn explicit_min_idle_is_not_lowered() {
        let parsed = ConfigFile {
            database: Some(DatabaseFile {
                min_idle: Some(5),
                ..DatabaseFile::default()
            }),
        };
        let err = build_config(parsed, |key| {
            (key == ENV_DB_MAX_CONNECTIONS).then(|| "3".to_string())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidMinIdle {
                min_idle: 5,
                max_connections: 3
            }
        ));
    }

    #[test]
    fn env_override_rejects_garbage() {
        let mut config = AppConfig::default();
        let err = apply_env_overrides(&mut config, |key| {
            (key == ENV_DB_MAX_CONNECTIONS).then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { .. }));
    }

    #[test]
    fn validate_rejects_inconsistent_pool() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidMaxConnections(0))
        ));

        let mut config = AppConfig::default();
        config.database.max_connections = 2;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidMinIdle { .. })
        ));

        let mut config = AppConfig::default();
        config.database.busy_timeout_ms = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidTimeout { .. })
        ));
    }

    #[test]
    fn load_at_path_requires_file_when_requested() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("config.toml");
        let err = load_at_path(&missing, true).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("config file not found"));
        assert!(load_at_path(&missing, false).expect("optional").is_none());
    }

    #[test]
    fn load_at_path_parses_toml() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[database]\nmax_connections = 10\nmax_lifetime_secs = 120\n",
        )
        .expect("write config");
        restrict_permissions(&path);

        let parsed = load_at_path(&path, true).expect("load").expect("config");
        let config = merge_config(parsed).expect("merge");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.max_lifetime_secs, 120);
    }

    #[test]
    fn load_at_path_rejects_unknown_keys() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[database]\nhost = \"localhost\"\n").expect("write config");
        restrict_permissions(&path);

        let err = load_at_path(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn load_at_path_rejects_world_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "").expect("write config");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&path, perms).expect("chmod");

        let err = load_at_path(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::InsecurePermissions(_)));
    }
}
