use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment prefix; `APP__SERVER__PORT=9000` overrides `server.port`.
const ENV_PREFIX: &str = "APP__";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Process configuration: the `server` and `logging` sections plus an untyped
/// section per module, read back with [`AppConfig::module_config`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// `None` until a file or the CLI provides it.
    pub logging: Option<LoggingConfig>,
    /// Extra `<module>.yaml` files merged into `modules` at load time.
    #[serde(default)]
    pub modules_dir: Option<String>,
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Working root for relative log paths. Absolute after loading.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Per-request timeout; 0 selects the default.
    #[serde(default)]
    pub timeout_sec: u64,
}

/// Logging sections keyed by target prefix. The `default` key covers every
/// target without a section of its own.
pub type LoggingConfig = HashMap<String, LogSection>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSection {
    /// `trace`, `debug`, `info`, `warn`, `error` or `off`.
    pub console_level: String,
    /// JSON log file; empty disables file output for the section.
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    /// Rotation threshold in MiB.
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl LogSection {
    pub fn has_file(&self) -> bool {
        !self.file.trim().is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModuleConfigError {
    #[error("invalid configuration for module '{module}': {source}")]
    Invalid {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Command-line options that adjust a loaded config. The config path itself
/// goes straight to [`AppConfig::load_or_default`].
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".into(),
            port: 8087,
            timeout_sec: 0,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        match self.timeout_sec {
            0 => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Rewrites `home_dir` as an absolute path and creates the directory.
    /// Empty means the working directory and a leading `~` expands to `$HOME`.
    fn resolve_home_dir(&mut self) -> Result<()> {
        let cwd = std::env::current_dir().context("current directory is not accessible")?;
        let raw = self.home_dir.trim();

        let dir = match raw.strip_prefix('~') {
            _ if raw.is_empty() => cwd,
            Some(rest) => user_home()?.join(rest.trim_start_matches(['/', '\\'])),
            None => cwd.join(raw),
        };

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create server.home_dir {}", dir.display()))?;
        self.home_dir = dir.to_string_lossy().into_owned();
        Ok(())
    }
}

fn user_home() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .context("cannot expand '~' in server.home_dir: HOME is not set")
}

/// Built-in logging: info on the console, debug into a rotating JSON file.
pub fn default_logging_config() -> LoggingConfig {
    LoggingConfig::from([(
        "default".to_string(),
        LogSection {
            console_level: "info".into(),
            file: "logs/resource-server.log".into(),
            file_level: "debug".into(),
            max_size_mb: Some(100),
        },
    )])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Reads `path` over the built-in server defaults, then `APP__*` variables.
    /// Module files from `modules_dir` replace inline sections of the same name.
    pub fn load_layered<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("config file not found: {}", path.display());
        }

        let mut config: AppConfig = Self::sources(path)
            .extract()
            .with_context(|| format!("Failed to extract config from {}", path.display()))?;

        config.server.resolve_home_dir()?;
        if let Some(dir) = config.modules_dir.as_deref() {
            let files = read_module_files(Path::new(dir))?;
            config.modules.extend(files);
        }
        Ok(config)
    }

    fn sources(path: &Path) -> Figment {
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };
        Figment::from(Serialized::defaults(base))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Without a path the built-in defaults are used.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_layered(path);
        }
        let mut config = Self::default();
        config.server.resolve_home_dir()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Typed view of one module's section; `None` when the module is not configured.
    pub fn module_config<T: DeserializeOwned>(
        &self,
        module: &str,
    ) -> Result<Option<T>, ModuleConfigError> {
        let Some(raw) = self.modules.get(module) else {
            return Ok(None);
        };
        T::deserialize(raw)
            .map(Some)
            .map_err(|source| ModuleConfigError::Invalid {
                module: module.to_string(),
                source,
            })
    }

    /// `--port` replaces `server.port`; `-v` / `-vv` raise the default console level.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let level = match args.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        };
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let (Some(level), Some(section)) = (level, logging.get_mut("default")) {
            section.console_level = level.to_string();
        }
    }
}

/// `<name>.yaml` / `<name>.yml` files in `dir`, keyed by file stem.
/// A missing directory yields nothing.
fn read_module_files(dir: &Path) -> Result<Vec<(String, serde_json::Value)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut sections = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))? {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        let stem = path.file_stem().and_then(|s| s.to_str());
        let (true, true, Some(module)) = (path.is_file(), is_yaml, stem) else {
            continue;
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let value: serde_json::Value = serde_yaml::from_str(&text)
            .with_context(|| format!("invalid YAML in {}", path.display()))?;
        sections.push((module.to_string(), value));
    }
    Ok(sections)
}
