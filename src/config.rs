//src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{GeneratorError, Result};

/// Header acceptance settings for the record stream parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Reject records whose header declares `length=` above this value.
    /// `None` accepts every well-formed header regardless of its length.
    ///
    /// This is unrelated to the 32-base classification boundary.
    pub max_declared_length: Option<usize>,
}

impl ParserConfig {
    pub fn with_max_declared_length(max: usize) -> Self {
        ParserConfig {
            max_declared_length: Some(max),
        }
    }
}

/// Per-run settings of the unique k-mer sampler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingParameters {
    /// Hard cap on the number of emitted k-mers across the whole run.
    pub max_rows: usize,
    /// Corpus entries shorter than this are skipped.
    pub min_sequence_length: usize,
    /// Corpus entries longer than this are skipped.
    pub max_sequence_length: usize,
    /// Upper bound of the k draw; the effective bound is `min(max_k, len)`.
    pub max_k: usize,
    /// Seed of the run-scoped generator used for k draws.
    pub seed: u64,
}

impl Default for SamplingParameters {
    fn default() -> Self {
        SamplingParameters {
            max_rows: 100_000_000,
            min_sequence_length: 1,
            max_sequence_length: 100,
            max_k: 32,
            seed: 0,
        }
    }
}

impl SamplingParameters {
    pub fn validate(&self) -> Result<()> {
        if self.min_sequence_length == 0 {
            return Err(GeneratorError::InvalidParameter(
                "min_sequence_length must be at least 1".to_string(),
            ));
        }
        if self.min_sequence_length > self.max_sequence_length {
            return Err(GeneratorError::InvalidParameter(format!(
                "min_sequence_length ({}) exceeds max_sequence_length ({})",
                self.min_sequence_length, self.max_sequence_length
            )));
        }
        if self.max_k == 0 {
            return Err(GeneratorError::InvalidParameter(
                "max_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a corpus entry of `len` characters takes part in sampling.
    pub fn accepts_length(&self, len: usize) -> bool {
        (self.min_sequence_length..=self.max_sequence_length).contains(&len)
    }
}

/// What to do when a sink refuses a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Abort the load on the first failure and report it.
    #[default]
    FailFast,
    /// Log the failure, count it, and move on to the next record.
    SkipAndContinue,
}

/// Top-level configuration file. Every section is optional.
///
/// ```toml
/// error_policy = "skip-and-continue"
///
/// [parser]
/// max_declared_length = 35
///
/// [sampling]
/// max_rows = 1000000
/// seed = 42
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub parser: ParserConfig,
    pub sampling: SamplingParameters,
    pub error_policy: ErrorPolicy,
}

impl GeneratorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: GeneratorConfig = toml::from_str(contents)?;
        config.sampling.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| GeneratorError::io(path, e))?;
        GeneratorConfig::from_toml_str(&contents).map_err(|e| GeneratorError::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}
