//! Pipeline configuration (§12): a TOML file with an env-var override,
//! every field defaulted, identical in spirit to how this codebase's
//! daemon loads its own config — a bad or missing file never aborts a
//! run, it just falls back to the built-in defaults.

use std::path::PathBuf;

use serde::Deserialize;

const CONFIG_ENV_VAR: &str = "RECON_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "/etc/recon/recon.toml";

fn default_strict() -> bool {
    true
}

fn default_include_pre_existing_frees() -> bool {
    false
}

fn default_verbose() -> bool {
    false
}

/// Parsing-stage knobs (§4.1, §7).
#[derive(Debug, Deserialize, Clone)]
pub struct ParsingConfig {
    /// Strict mode turns a malformed known-tag record into a fatal
    /// [`crate::error::ReconError::MalformedRecord`]. Lenient mode logs
    /// an advisory and skips the line. Unknown tags are never fatal in
    /// either mode.
    #[serde(default = "default_strict")]
    pub strict: bool,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            strict: default_strict(),
        }
    }
}

/// Oracle-stage knobs (§4.4).
#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    /// Whether a death of an object the oracle never saw allocated (a
    /// pre-existing object at trace start) is emitted as a free event
    /// with a zeroed size/site, or silently dropped.
    #[serde(default = "default_include_pre_existing_frees")]
    pub include_pre_existing_frees: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            include_pre_existing_frees: default_include_pre_existing_frees(),
        }
    }
}

/// Diagnostics knobs.
#[derive(Debug, Deserialize, Clone)]
pub struct DiagnosticsConfig {
    /// Emit advisories that are otherwise too chatty for routine runs
    /// (e.g. every reference to a never-allocated object).
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            verbose: default_verbose(),
        }
    }
}

/// Output destinations. A `None` path disables that sink entirely.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputPaths {
    pub augmented_trace: Option<PathBuf>,
    pub oracle_text: Option<PathBuf>,
    pub oracle_csv: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub parsing: ParsingConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub output: OutputPaths,
}

impl PipelineConfig {
    /// Load from `$RECON_CONFIG`, falling back to
    /// [`DEFAULT_CONFIG_PATH`], falling back to built-in defaults if
    /// either the file is missing or fails to parse. This never returns
    /// an error: a broken config file is an operational condition, not
    /// a reason to refuse to run.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(err) => {
                    log::warn!("failed to parse config at {}: {err}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                log::debug!("no config at {}: {err}, using defaults", path.display());
                Self::default()
            }
        }
    }
}
