//! Configuration data structures for canonize.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files and
//! carry serde defaults so that minimal configs stay concise. The redirect
//! section is turned into a frozen [`RedirectEngine`] by
//! [`RedirectSettings::build_engine`].
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    adapters::CsvRuleSource,
    core::{RedirectEngine, RuleError},
};

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `canonize=debug,tower_http=info`
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// One inline `pattern -> replacement` rule
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RegexRedirectEntry {
    pub pattern: String,
    pub replacement: String,
}

/// Redirect policies as written in the configuration file.
///
/// All policies are disabled by default.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RedirectSettings {
    pub force_host: Option<String>,
    pub force_tls: bool,
    pub force_lower_case: bool,
    pub force_lower_case_ignore: Option<String>,
    pub force_trailing_slash: bool,
    pub force_trailing_slash_ignore: Option<String>,
    pub force_no_trailing_slash: bool,
    pub force_no_trailing_slash_ignore: Option<String>,
    /// Inline exact redirects, `path -> target`
    pub redirects: HashMap<String, String>,
    /// Inline regex redirects, applied in the listed order
    pub regex_redirects: Vec<RegexRedirectEntry>,
    /// Two-column CSV file with exact redirects
    pub redirects_file: Option<String>,
    /// Two-column CSV file with regex redirects
    pub regex_redirects_file: Option<String>,
}

impl RedirectSettings {
    /// Build the engine: policies first, then inline rules, then rule files.
    ///
    /// File rules are appended after inline ones, so a file entry replaces an
    /// inline exact redirect for the same path and file regex rules are tried
    /// after inline regex rules.
    pub fn build_engine(&self) -> Result<RedirectEngine, RuleError> {
        let mut builder = RedirectEngine::builder()
            .force_tls(self.force_tls)
            .force_lower_case(self.force_lower_case)
            .force_trailing_slash(self.force_trailing_slash)
            .force_no_trailing_slash(self.force_no_trailing_slash);

        if let Some(host) = &self.force_host {
            builder = builder.force_host(host.clone());
        }
        if let Some(pattern) = &self.force_lower_case_ignore {
            builder = builder.force_lower_case_ignore(pattern.clone());
        }
        if let Some(pattern) = &self.force_trailing_slash_ignore {
            builder = builder.force_trailing_slash_ignore(pattern.clone());
        }
        if let Some(pattern) = &self.force_no_trailing_slash_ignore {
            builder = builder.force_no_trailing_slash_ignore(pattern.clone());
        }

        for (path, target) in &self.redirects {
            builder = builder.redirect(path.clone(), target.clone());
        }
        for entry in &self.regex_redirects {
            builder = builder.regex_redirect(&entry.pattern, entry.replacement.clone())?;
        }

        if let Some(file) = self.redirects_file.as_deref().filter(|f| !f.is_empty()) {
            builder.append_redirects(&CsvRuleSource::new(file))?;
        }
        if let Some(file) = self
            .regex_redirects_file
            .as_deref()
            .filter(|f| !f.is_empty())
        {
            builder.append_regex_redirects(&CsvRuleSource::new(file))?;
        }

        builder.build()
    }
}

/// Top level configuration of the `canonize` server
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Directory served behind the redirect layer; requests that are not
    /// redirected get a 404 when unset
    #[serde(default)]
    pub static_root: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub redirect: RedirectSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            static_root: None,
            logging: LoggingConfig::default(),
            redirect: RedirectSettings::default(),
        }
    }
}
