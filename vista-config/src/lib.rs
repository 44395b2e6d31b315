//! Loader for Vista configuration with YAML + environment overlays.
//!
//! Files and inline YAML are merged in the order they are added, later ones
//! winning, and the environment is layered on top of all of them.
//! `VISTA_`-prefixed environment variables use `__` to separate nested keys,
//! so `VISTA_WEBDRIVER__URL` overrides `webdriver.url`. String values may
//! reference other environment variables as `${VAR}`; unknown variables are
//! left untouched.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vista_common::observability::{LogConfig, LogFormat};
use vista_common::VistaError;
use vista_extract::{Page, Wait};

pub mod schema;

pub use schema::{ContentSpec, FieldSpec, PageSpec, SlotSpec, ViewSpec};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VistaConfig {
    pub webdriver: WebDriverSettings,
    pub wait: WaitSettings,
    pub logging: LoggingSettings,
    pub pages: Vec<PageSpec>,
}

impl VistaConfig {
    pub fn page(&self, name: &str) -> Option<&PageSpec> {
        self.pages.iter().find(|page| page.name == name)
    }

    /// Build the named page with the configured default lookup timeout.
    pub fn build_page(&self, name: &str) -> Result<Page, VistaError> {
        self.page(name)
            .ok_or_else(|| VistaError::Config(format!("no page named `{name}`")))?
            .build_with(self.wait.timeout())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

/// Where and how to open a WebDriver session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WebDriverSettings {
    pub url: String,
    pub headless: bool,
    pub browser: BrowserKind,
    /// Extra command-line arguments handed to the browser.
    pub args: Vec<String>,
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9515".into(),
            headless: false,
            browser: BrowserKind::Chrome,
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    /// Lookup timeout for slots that do not declare their own.
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Upper bound for waiting on a page to unload.
    pub detach_timeout_ms: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 0,
            poll_interval_ms: 500,
            detach_timeout_ms: 300_000,
        }
    }
}

impl WaitSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn detach_timeout(&self) -> Duration {
        Duration::from_millis(self.detach_timeout_ms)
    }

    pub fn to_wait(&self) -> Wait {
        Wait::new(self.timeout()).with_poll_interval(self.poll_interval())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogEncoding {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub app_name: String,
    pub dir: Option<PathBuf>,
    pub stderr: bool,
    pub format: LogEncoding,
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            app_name: "vista".into(),
            dir: None,
            stderr: false,
            format: LogEncoding::Text,
            filter: "info".into(),
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            app_name: self.app_name.clone(),
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: match self.format {
                LogEncoding::Text => LogFormat::Text,
                LogEncoding::Json => LogFormat::Json,
            },
            default_filter: self.filter.clone(),
        }
    }
}

/// Expand `${VAR}` and `$VAR` until nothing changes or the depth cap is hit.
/// A reference to an unset variable leaves the string as it is.
fn expand_placeholders(input: &str) -> String {
    let mut current = input.to_string();
    for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
        match shellexpand::env(&current) {
            Ok(next) if next != current => current = next.into_owned(),
            _ => break,
        }
    }
    current
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => *s = expand_placeholders(s),
        Value::Array(items) => items.iter_mut().for_each(expand_env_in_value),
        Value::Object(map) => map.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (files, inline YAML, env).
pub struct VistaConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for VistaConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl VistaConfigLoader {
    /// Start with no sources; every setting has a default and `VISTA_`
    /// environment overrides are applied by [`VistaConfigLoader::load`].
    ///
    /// ```
    /// use vista_config::VistaConfigLoader;
    ///
    /// let config = VistaConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.webdriver.url, "http://localhost:9515");
    /// assert_eq!(config.wait.poll_interval_ms, 500);
    /// assert!(config.pages.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use vista_config::{BrowserKind, VistaConfigLoader};
    ///
    /// let config = VistaConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// webdriver:
    ///   browser: firefox
    ///   headless: true
    /// pages:
    ///   - name: home
    ///     slots:
    ///       - { name: title, kind: field, selector: tag, value: h1, parse: text }
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.webdriver.browser, BrowserKind::Firefox);
    /// assert!(config.webdriver.headless);
    /// assert!(config.page("home").is_some());
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources with the environment last, expand `${VAR}`
    /// placeholders and deserialize.
    ///
    /// Pages are built once here so schema mistakes surface at load time
    /// rather than on the first extraction.
    pub fn load(self) -> Result<VistaConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("VISTA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: VistaConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        if typed.wait.poll_interval_ms == 0 {
            return Err(ConfigError::Message(
                "wait.poll_interval_ms must be greater than zero".into(),
            ));
        }
        for page in &typed.pages {
            page.build()
                .map_err(|e| ConfigError::Message(e.to_string()))?;
        }

        Ok(typed)
    }
}
