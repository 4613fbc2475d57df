//! Server configuration.
//!
//! Sources, lowest priority first: built-in defaults, the YAML file, then
//! `FASTBLOG_*` environment variables (`.` and `-` in a key become `_`, so
//! `mysql.max-idle-connections` is `FASTBLOG_MYSQL_MAX_IDLE_CONNECTIONS`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
    value::Uncased,
};
use serde::Deserialize;
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{AnyPool, ConnectOptions};
use thiserror::Error;

use fastblog_observability::LogOptions;

pub const ENV_PREFIX: &str = "FASTBLOG_";
pub const DEFAULT_CONFIG_DIR: &str = ".fastblog";
pub const DEFAULT_CONFIG_FILE: &str = "fb-apiserver.yaml";

/// Every key that may be overridden from the environment.
const KEYS: &[&str] = &[
    "server-mode",
    "jwt-key",
    "expiration",
    "http.addr",
    "http.timeout",
    "grpc.addr",
    "grpc.timeout",
    "mysql.addr",
    "mysql.username",
    "mysql.password",
    "mysql.database",
    "mysql.max-idle-connections",
    "mysql.max-open-connections",
    "mysql.max-connection-life-time",
    "log.level",
    "log.format",
    "log.disable-caller",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found (searched: {})", display_paths(.0))]
    NotFound(Vec<PathBuf>),
    #[error("failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which protocol surface the process serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerMode {
    Http,
    Grpc,
    #[default]
    GrpcGateway,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerOptions {
    pub server_mode: ServerMode,
    pub jwt_key: String,
    /// Lifetime of issued tokens.
    #[serde(with = "humantime_serde")]
    pub expiration: Duration,
    pub http: HttpOptions,
    pub grpc: GrpcOptions,
    pub mysql: MySqlOptions,
    pub log: LogOptions,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            server_mode: ServerMode::default(),
            jwt_key: String::new(),
            expiration: Duration::from_secs(2 * 60 * 60),
            http: HttpOptions::default(),
            grpc: GrpcOptions::default(),
            mysql: MySqlOptions::default(),
            log: LogOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpOptions {
    pub addr: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:6666".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GrpcOptions {
    pub addr: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for GrpcOptions {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:39090".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MySqlOptions {
    pub addr: String,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Connections kept open while idle.
    pub max_idle_connections: u32,
    pub max_open_connections: u32,
    #[serde(with = "humantime_serde")]
    pub max_connection_life_time: Duration,
}

impl Default for MySqlOptions {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3306".to_string(),
            username: String::new(),
            password: String::new(),
            database: String::new(),
            max_idle_connections: 100,
            max_open_connections: 100,
            max_connection_life_time: Duration::from_secs(10),
        }
    }
}

impl ServerOptions {
    /// Load from `path`, or from the first `fb-apiserver.yaml` found in the
    /// search directories, then apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(path) => return Err(ConfigError::NotFound(vec![path.to_path_buf()])),
            None => find_config_file()?,
        };

        let opts: Self = Self::figment(&file).extract().map_err(Box::new)?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn figment(file: &Path) -> Figment {
        Figment::new().merge(Yaml::file(file)).merge(env_provider())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_addr("http.addr", &self.http.addr)?;
        validate_addr("grpc.addr", &self.grpc.addr)?;
        self.mysql.validate()?;

        if self.jwt_key.chars().count() < 6 {
            return Err(ConfigError::Invalid("jwt-key must be at least 6 characters".into()));
        }
        if self.expiration.is_zero() {
            return Err(ConfigError::Invalid("expiration must be greater than 0".into()));
        }
        Ok(())
    }
}

impl MySqlOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_addr("mysql.addr", &self.addr)?;

        for (key, value) in [
            ("mysql.username", &self.username),
            ("mysql.password", &self.password),
            ("mysql.database", &self.database),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Invalid(format!("{key} cannot be empty")));
            }
        }

        if self.max_idle_connections == 0 || self.max_open_connections == 0 {
            return Err(ConfigError::Invalid("mysql connection limits must be greater than 0".into()));
        }
        if self.max_open_connections < self.max_idle_connections {
            return Err(ConfigError::Invalid(
                "mysql.max-open-connections must not be less than mysql.max-idle-connections".into(),
            ));
        }
        if self.max_connection_life_time.is_zero() {
            return Err(ConfigError::Invalid("mysql.max-connection-life-time must be greater than 0".into()));
        }
        Ok(())
    }

    /// Connect a pool with the configured limits.
    pub async fn new_pool(&self) -> Result<AnyPool, sqlx::Error> {
        sqlx::any::install_default_drivers();

        let (host, port) = split_addr(&self.addr)
            .ok_or_else(|| sqlx::Error::Configuration(format!("invalid mysql addr '{}'", self.addr).into()))?;
        let url = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
            .to_url_lossy();

        AnyPoolOptions::new()
            .max_connections(self.max_open_connections)
            .min_connections(self.max_idle_connections)
            .max_lifetime(self.max_connection_life_time)
            .connect_with(AnyConnectOptions::from_url(&url)?)
            .await
    }
}

fn env_key(path: &str) -> String {
    path.replace(['.', '-'], "_")
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).filter_map(|key| {
        KEYS.iter()
            .find(|path| key.as_str().eq_ignore_ascii_case(&env_key(path)))
            .map(|path| Uncased::from(*path))
    })
}

fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::with_capacity(3);
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(DEFAULT_CONFIG_DIR));
    }
    dirs.push(PathBuf::from("."));
    dirs.push(PathBuf::from("./configs"));
    dirs
}

fn find_config_file() -> Result<PathBuf, ConfigError> {
    let candidates: Vec<PathBuf> = search_dirs().into_iter().map(|dir| dir.join(DEFAULT_CONFIG_FILE)).collect();
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or(ConfigError::NotFound(candidates))
}

fn split_addr(addr: &str) -> Option<(&str, u16)> {
    let (host, port) = addr.rsplit_once(':')?;
    let port = port.parse::<u16>().ok().filter(|p| *p > 0)?;
    Some((host.trim_start_matches('[').trim_end_matches(']'), port))
}

fn validate_addr(key: &str, addr: &str) -> Result<(), ConfigError> {
    if addr.is_empty() {
        return Err(ConfigError::Invalid(format!("{key} cannot be empty")));
    }
    if split_addr(addr).is_none() {
        return Err(ConfigError::Invalid(format!("{key}: invalid address '{addr}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    const SAMPLE: &str = r#"
server-mode: http
jwt-key: Rtg8BPKNEf2mB4mgvKONGPZZQSaJWNLijxR42qRgq0iBb5
expiration: 1h
http:
  addr: 127.0.0.1:6666
mysql:
  addr: 127.0.0.1:3306
  username: fastblog
  password: fastblog1234
  database: fastblog
  max-idle-connections: 10
  max-open-connections: 20
  max-connection-life-time: 10s
log:
  level: debug
  format: console
"#;

    fn valid() -> ServerOptions {
        ServerOptions {
            jwt_key: "secret-key".into(),
            mysql: MySqlOptions {
                username: "u".into(),
                password: "p".into(),
                database: "d".into(),
                ..MySqlOptions::default()
            },
            ..ServerOptions::default()
        }
    }

    #[test]
    fn loads_file_with_defaults_filled_in() {
        Jail::expect_with(|jail| {
            jail.create_file("fb-apiserver.yaml", SAMPLE)?;
            let opts = ServerOptions::load(Some(Path::new("fb-apiserver.yaml"))).map_err(|e| e.to_string())?;

            assert_eq!(opts.server_mode, ServerMode::Http);
            assert_eq!(opts.expiration, Duration::from_secs(3600));
            assert_eq!(opts.http.addr, "127.0.0.1:6666");
            assert_eq!(opts.http.timeout, Duration::from_secs(30));
            assert_eq!(opts.grpc.addr, "0.0.0.0:39090");
            assert_eq!(opts.mysql.max_open_connections, 20);
            assert_eq!(opts.log.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("fb-apiserver.yaml", SAMPLE)?;
            jail.set_env("FASTBLOG_SERVER_MODE", "grpc");
            jail.set_env("FASTBLOG_HTTP_ADDR", "127.0.0.1:7777");
            jail.set_env("FASTBLOG_MYSQL_MAX_IDLE_CONNECTIONS", "5");
            jail.set_env("FASTBLOG_UNRELATED", "ignored");

            let opts = ServerOptions::load(Some(Path::new("fb-apiserver.yaml"))).map_err(|e| e.to_string())?;
            assert_eq!(opts.server_mode, ServerMode::Grpc);
            assert_eq!(opts.http.addr, "127.0.0.1:7777");
            assert_eq!(opts.mysql.max_idle_connections, 5);
            Ok(())
        });
    }

    #[test]
    fn searches_config_directories() {
        Jail::expect_with(|jail| {
            jail.set_env("HOME", jail.directory().join("home").display());
            std::fs::create_dir_all(jail.directory().join("configs")).map_err(|e| e.to_string())?;
            jail.create_file("configs/fb-apiserver.yaml", SAMPLE)?;

            let opts = ServerOptions::load(None).map_err(|e| e.to_string())?;
            assert_eq!(opts.mysql.database, "fastblog");
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_an_error() {
        Jail::expect_with(|jail| {
            jail.set_env("HOME", jail.directory().join("home").display());
            assert!(matches!(ServerOptions::load(None), Err(ConfigError::NotFound(_))));
            assert!(matches!(
                ServerOptions::load(Some(Path::new("nope.yaml"))),
                Err(ConfigError::NotFound(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn unknown_server_mode_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("fb-apiserver.yaml", &SAMPLE.replace("server-mode: http", "server-mode: gin"))?;
            assert!(matches!(
                ServerOptions::load(Some(Path::new("fb-apiserver.yaml"))),
                Err(ConfigError::Load(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn validate_accepts_defaults_with_credentials() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut opts = valid();
        opts.http.addr = "localhost".into();
        assert!(opts.validate().is_err());

        let mut opts = valid();
        opts.grpc.addr = "0.0.0.0:70000".into();
        assert!(opts.validate().is_err());

        let mut opts = valid();
        opts.jwt_key = "short".into();
        assert!(opts.validate().is_err());

        let mut opts = valid();
        opts.mysql.max_open_connections = 10;
        opts.mysql.max_idle_connections = 20;
        assert!(opts.validate().is_err());

        let mut opts = valid();
        opts.mysql.max_connection_life_time = Duration::ZERO;
        assert!(opts.validate().is_err());

        let mut opts = valid();
        opts.mysql.database.clear();
        assert!(opts.validate().is_err());
    }

    #[test]
    fn env_keys_replace_separators() {
        assert_eq!(env_key("mysql.max-idle-connections"), "mysql_max_idle_connections");
        assert_eq!(env_key("jwt-key"), "jwt_key");
    }
}
