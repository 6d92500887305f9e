use crate::client::ConnectMode;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Module as written in the configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Shared secret used to obfuscate packet bodies
    #[serde(default)]
    pub secret: String,

    /// Ask the server for single-connect mode
    #[serde(default)]
    pub single_connect: bool,

    /// Assume single-connect support without negotiation
    #[serde(default)]
    pub legacy_single_connect: bool,

    #[serde(default)]
    pub privilege_level: u8,

    /// Port label sent in the authentication START
    #[serde(default = "default_port")]
    pub port: String,

    /// Probe timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_port() -> String {
    "probe".to_string()
}

/// Longest accepted probe timeout, in seconds
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

fn default_timeout() -> u64 {
    5
}

impl ModuleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::Invalid("username must not be empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Invalid("password must not be empty".to_string()));
        }
        if self.secret.is_empty() {
            return Err(ConfigError::Invalid("secret must not be empty".to_string()));
        }
        if self.timeout == 0 {
            return Err(ConfigError::Invalid("timeout must be greater than 0".to_string()));
        }
        if self.timeout > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "timeout must be at most {} seconds",
                MAX_TIMEOUT_SECS
            )));
        }
        Ok(())
    }
}

/// Validated, immutable probe module
#[derive(Clone, PartialEq, Eq)]
pub struct Module {
    pub username: String,
    pub password: String,
    pub secret: Vec<u8>,
    pub connect_mode: ConnectMode,
    pub privilege_level: u8,
    pub port: String,
    pub timeout: Duration,
}

impl Module {
    /// Create a module from its configuration, validating it first
    pub fn new(config: ModuleConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let connect_mode = if config.legacy_single_connect {
            ConnectMode::LegacyMultiplex
        } else if config.single_connect {
            ConnectMode::Multiplex
        } else {
            ConnectMode::Single
        };

        Ok(Module {
            username: config.username,
            password: config.password,
            secret: config.secret.into_bytes(),
            connect_mode,
            privilege_level: config.privilege_level,
            port: config.port,
            timeout: Duration::from_secs(config.timeout),
        })
    }
}

// Password and secret stay out of logs
impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("secret", &"<redacted>")
            .field("connect_mode", &self.connect_mode)
            .field("privilege_level", &self.privilege_level)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    modules: HashMap<String, ModuleConfig>,
}

/// Exporter configuration: probe modules keyed by name
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct Config {
    modules: HashMap<String, Module>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&contents)?;
        info!(modules = config.modules.len(), "Loaded config successfully");
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;

        let mut modules = HashMap::with_capacity(file.modules.len());
        for (name, module) in file.modules {
            let module = Module::new(module).map_err(|e| match e {
                ConfigError::Invalid(reason) => {
                    ConfigError::Invalid(format!("module {:?}: {}", name, reason))
                }
                other => other,
            })?;
            modules.insert(name, module);
        }

        Self::from_modules(modules)
    }

    /// Build a configuration from already validated modules
    pub fn from_modules(modules: HashMap<String, Module>) -> Result<Self, ConfigError> {
        if modules.is_empty() {
            return Err(ConfigError::Invalid("no modules configured".to_string()));
        }
        Ok(Config { modules })
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Module names in sorted order
    pub fn module_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse_module(yaml: &str) -> Result<Module, ConfigError> {
        let config: ModuleConfig = serde_yaml::from_str(yaml)?;
        Module::new(config)
    }

    #[test]
    fn test_module_minimum_fields() {
        let module = parse_module("username: test\npassword: password\nsecret: secret").unwrap();

        assert_eq!(module.username, "test");
        assert_eq!(module.password, "password");
        assert_eq!(module.secret, b"secret");
        assert_eq!(module.connect_mode, ConnectMode::Single);
        assert_eq!(module.privilege_level, 0);
        assert_eq!(module.port, "probe");
        assert_eq!(module.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_module_all_options() {
        let yaml = "username: test
password: test
secret: secret
single_connect: true
legacy_single_connect: true
timeout: 2
privilege_level: 1
port: tty0";
        let module = parse_module(yaml).unwrap();

        assert_eq!(module.connect_mode, ConnectMode::LegacyMultiplex);
        assert_eq!(module.privilege_level, 1);
        assert_eq!(module.port, "tty0");
        assert_eq!(module.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_module_single_connect_only() {
        let module =
            parse_module("username: u\npassword: p\nsecret: s\nsingle_connect: true").unwrap();
        assert_eq!(module.connect_mode, ConnectMode::Multiplex);
    }

    #[test]
    fn test_module_missing_required_fields() {
        assert!(parse_module("password: test\nsecret: secret").is_err());
        assert!(parse_module("username: test\nsecret: secret").is_err());
        assert!(parse_module("username: test\npassword: test").is_err());
        assert!(parse_module("username: test\npassword: test\nsecret: \"\"").is_err());
    }

    #[test]
    fn test_module_rejects_zero_timeout() {
        assert!(parse_module("username: u\npassword: p\nsecret: s\ntimeout: 0").is_err());
    }

    #[test]
    fn test_module_timeout_upper_bound() {
        let module = parse_module("username: u\npassword: p\nsecret: s\ntimeout: 86400").unwrap();
        assert_eq!(module.timeout, Duration::from_secs(MAX_TIMEOUT_SECS));

        assert!(matches!(
            parse_module("username: u\npassword: p\nsecret: s\ntimeout: 86401"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse_module("username: u\npassword: p\nsecret: s\ntimeout: 18446744073709551615"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_module_rejects_unknown_field() {
        assert!(matches!(
            parse_module("username: u\npassword: p\nsecret: s\nsecrett: x"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_module_rejects_out_of_range_privilege() {
        assert!(parse_module("username: u\npassword: p\nsecret: s\nprivilege_level: 256").is_err());
    }

    #[test]
    fn test_module_debug_redacts_credentials() {
        let module = parse_module("username: u\npassword: hunter2\nsecret: s3cr3t").unwrap();
        let debug = format!("{:?}", module);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "modules:\n  test:\n    username: test\n    password: test\n    secret: test"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        let module = config.module("test").expect("module 'test' not found");
        assert_eq!(module.username, "test");
        assert_eq!(module.secret, b"test");
        assert_eq!(module.port, "probe");
        assert_eq!(module.timeout, Duration::from_secs(5));
        assert!(config.module("other").is_none());
    }

    #[test]
    fn test_config_missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/tacacs/config.yml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_config_no_modules() {
        assert!(matches!(
            Config::from_yaml_str("modules: {}"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_yaml_str("{}"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_config_invalid_yaml() {
        assert!(matches!(
            Config::from_yaml_str("abcdefg"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_config_invalid_module_names_module() {
        let err = Config::from_yaml_str("modules:\n  broken:\n    username: u\n    password: p")
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_module_names_sorted() {
        let yaml = "modules:
  zeta: {username: u, password: p, secret: s}
  alpha: {username: u, password: p, secret: s}";
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.module_names(), vec!["alpha", "zeta"]);
    }
}
