//! Configuration loading and typed config structures.
//!
//! A run is described by a YAML file (by default `diffnet-config.yaml` at the
//! project root). This module defines strongly-typed structs that mirror the
//! YAML structure and a loader that reads, overrides, and validates it. Every
//! field has a default, so an empty document is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use diffnet_graph::{GeneratorKind, RewireStrategy};
use diffnet_types::{ExposureDirection, FailurePolicy, NodeId};

use crate::exposure::ExposureArgs;
use crate::seed::SeedStrategy;
use crate::threshold::{ThresholdDist, ThresholdSampler};

/// Environment variable overriding `logging.level`.
pub const LOG_ENV: &str = "DIFFNET_LOG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level diffusion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffusionConfig {
    /// Vertex count `N`.
    #[serde(default = "default_n")]
    pub n: usize,

    /// Horizon `T` (number of time slices).
    #[serde(default = "default_t")]
    pub t: u32,

    /// Base seed of every random stream.
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Identifier stamped on reports.
    #[serde(default = "default_experiment_id")]
    pub experiment_id: String,

    /// Initial adopters.
    #[serde(default)]
    pub seed: SeedConfig,

    /// Network generator.
    #[serde(default)]
    pub graph: GeneratorKind,

    /// Draw an independent network for every slice.
    #[serde(default)]
    pub dynamic_graph: bool,

    /// Threshold distribution.
    #[serde(default)]
    pub threshold: ThresholdSampler,

    /// Rewire the network between steps.
    #[serde(default)]
    pub rewire: bool,

    /// Rewiring strategy, used when `rewire` is set.
    #[serde(default)]
    pub rewire_args: RewireStrategy,

    /// Exposure parameters.
    #[serde(default)]
    pub exposure: ExposureConfig,

    /// Replication batch settings.
    #[serde(default)]
    pub replication: ReplicationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            n: default_n(),
            t: default_t(),
            random_seed: default_random_seed(),
            experiment_id: default_experiment_id(),
            seed: SeedConfig::default(),
            graph: GeneratorKind::default(),
            dynamic_graph: false,
            threshold: ThresholdSampler::default(),
            rewire: false,
            rewire_args: RewireStrategy::default(),
            exposure: ExposureConfig::default(),
            replication: ReplicationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DiffusionConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `DIFFNET_LOG` overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(LOG_ENV) {
            self.logging.level = val;
        }
    }

    /// Check every value that a run would otherwise reject mid-way.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n == 0 {
            return Err(invalid("n", "network must have at least one vertex"));
        }
        if self.t == 0 {
            return Err(invalid("t", "horizon must be at least 1"));
        }
        match &self.seed.nodes {
            SeedNodes::Named(_) => {
                let p = self.seed.p_adopt;
                if !(p > 0.0 && p <= 1.0) {
                    return Err(invalid("seed.p_adopt", format!("{p} is not in (0, 1]")));
                }
            }
            SeedNodes::List(nodes) => {
                if nodes.is_empty() {
                    return Err(invalid("seed.nodes", "explicit seed list is empty"));
                }
                if let Some(node) = nodes.iter().find(|node| node.index() >= self.n) {
                    return Err(invalid(
                        "seed.nodes",
                        format!("node {node} is outside the {}-node network", self.n),
                    ));
                }
            }
        }
        self.threshold
            .check()
            .map_err(|err| invalid("threshold", err.to_string()))?;
        self.graph
            .check(self.n)
            .map_err(|err| invalid("graph", err.to_string()))?;
        if self.rewire {
            self.rewire_args
                .check(self.n)
                .map_err(|err| invalid("rewire_args", err.to_string()))?;
        }
        if self.replication.runs == 0 {
            return Err(invalid("replication.runs", "need at least one run"));
        }
        Ok(())
    }

    /// Seed strategy described by the `seed` section.
    pub fn seed_strategy(&self) -> SeedStrategy {
        let proportion = self.seed.p_adopt;
        match &self.seed.nodes {
            SeedNodes::Named(SeedMode::Random) => SeedStrategy::Random { proportion },
            SeedNodes::Named(SeedMode::Central) => SeedStrategy::Central { proportion },
            SeedNodes::Named(SeedMode::Marginal) => SeedStrategy::Marginal { proportion },
            SeedNodes::List(nodes) => SeedStrategy::Explicit {
                nodes: nodes.clone(),
            },
        }
    }

    /// Exposure parameters described by the `exposure` section.
    pub fn exposure_args(&self) -> ExposureArgs {
        let direction = self.exposure.direction.unwrap_or(if self.exposure.outgoing {
            ExposureDirection::Outgoing
        } else {
            ExposureDirection::Incoming
        });
        ExposureArgs {
            normalized: self.exposure.normalized,
            direction,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Named seed selection modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// Uniform random nodes.
    #[default]
    Random,
    /// Highest-degree nodes.
    Central,
    /// Lowest-degree nodes.
    Marginal,
}

/// Either a named mode or an explicit id list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedNodes {
    /// `random`, `central` or `marginal`.
    Named(SeedMode),
    /// Explicit seed ids.
    List(Vec<NodeId>),
}

impl Default for SeedNodes {
    fn default() -> Self {
        Self::Named(SeedMode::default())
    }
}

/// Seed configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Selection mode or explicit ids.
    #[serde(default)]
    pub nodes: SeedNodes,

    /// Fraction of nodes seeded by the named modes.
    #[serde(default = "default_p_adopt")]
    pub p_adopt: f64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            nodes: SeedNodes::default(),
            p_adopt: default_p_adopt(),
        }
    }
}

/// Exposure configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureConfig {
    /// Divide by total tie weight.
    #[serde(default = "default_true")]
    pub normalized: bool,

    /// Count outgoing ties (`false` = incoming).
    #[serde(default = "default_true")]
    pub outgoing: bool,

    /// Explicit direction; overrides `outgoing` when present.
    #[serde(default)]
    pub direction: Option<ExposureDirection>,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            normalized: true,
            outgoing: true,
            direction: None,
        }
    }
}

/// Replication batch configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Number of runs.
    #[serde(default = "default_runs")]
    pub runs: usize,

    /// Worker threads (0 = one per core).
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// What happens when a run fails.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            workers: default_workers(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_n() -> usize {
    1000
}

const fn default_t() -> u32 {
    20
}

const fn default_random_seed() -> u64 {
    42
}

fn default_experiment_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

const fn default_p_adopt() -> f64 {
    0.05
}

const fn default_true() -> bool {
    true
}

const fn default_runs() -> usize {
    1
}

const fn default_workers() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DiffusionConfig::default();
        assert_eq!(config.n, 1000);
        assert_eq!(config.t, 20);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.seed.nodes, SeedNodes::Named(SeedMode::Random));
        assert!(!config.rewire);
        assert_eq!(config.replication.failure_policy, FailurePolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = DiffusionConfig::parse("{}").unwrap();
        assert_eq!(config.n, 1000);
        assert_eq!(config.graph, GeneratorKind::SmallWorld { k: 8, p: 0.2 });
        assert!(!config.experiment_id.is_empty());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
n: 500
t: 5
random_seed: 7
seed:
  nodes: central
  p_adopt: 0.1
graph:
  kind: bernoulli
  p: 0.02
  directed: true
dynamic_graph: true
threshold:
  kind: constant
  value: 1.0
rewire: true
rewire_args:
  algorithm: degree_preserving
  swaps: 0.5
exposure:
  normalized: false
  outgoing: false
replication:
  runs: 50
  workers: 4
  failure_policy: continue
logging:
  level: debug
";
        let config = DiffusionConfig::parse(yaml).unwrap();
        assert_eq!(config.n, 500);
        assert_eq!(config.t, 5);
        assert_eq!(config.seed_strategy(), SeedStrategy::Central { proportion: 0.1 });
        assert_eq!(
            config.graph,
            GeneratorKind::Bernoulli {
                p: 0.02,
                directed: true
            }
        );
        assert!(config.dynamic_graph);
        assert_eq!(config.threshold, ThresholdSampler::Constant { value: 1.0 });
        assert_eq!(config.rewire_args, RewireStrategy::DegreePreserving { swaps: 0.5 });
        assert_eq!(
            config.exposure_args(),
            ExposureArgs {
                normalized: false,
                direction: ExposureDirection::Incoming
            }
        );
        assert_eq!(config.replication.runs, 50);
        assert_eq!(config.replication.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn explicit_seed_list_parses() {
        let config = DiffusionConfig::parse("n: 10\nseed:\n  nodes: [0, 5, 9]\n").unwrap();
        assert_eq!(
            config.seed_strategy(),
            SeedStrategy::Explicit {
                nodes: vec![NodeId(0), NodeId(5), NodeId(9)]
            }
        );
    }

    #[test]
    fn direction_overrides_outgoing_flag() {
        let config = DiffusionConfig::parse("exposure:\n  outgoing: false\n  direction: both\n").unwrap();
        assert_eq!(config.exposure_args().direction, ExposureDirection::Both);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for yaml in [
            "n: 0",
            "t: 0",
            "seed:\n  p_adopt: 0.0",
            "n: 5\nseed:\n  nodes: [7]",
            "threshold:\n  kind: uniform\n  low: 0.9\n  high: 0.1",
            "replication:\n  runs: 0",
            "n: 6\ngraph:\n  kind: ring\n  k: 8",
            "rewire: true\nrewire_args:\n  algorithm: endpoints\n  p: 1.5",
            "rewire: true\nrewire_args:\n  algorithm: degree_preserving\n  swaps: -2.0",
            "rewire: true\nrewire_args:\n  algorithm: regenerate\n  generator:\n    kind: scale_free\n    m: 0",
        ] {
            assert!(
                matches!(DiffusionConfig::parse(yaml), Err(ConfigError::Invalid { .. })),
                "accepted: {yaml}"
            );
        }
    }

    #[test]
    fn rewire_args_are_checked_at_parse_time() {
        let yaml = "rewire: true\nrewire_args:\n  algorithm: endpoints\n  p: 1.5";
        assert!(matches!(
            DiffusionConfig::parse(yaml),
            Err(ConfigError::Invalid {
                field: "rewire_args",
                ..
            })
        ));
        // Unused arguments are not checked.
        let unused = "rewire: false\nrewire_args:\n  algorithm: endpoints\n  p: 1.5";
        assert!(DiffusionConfig::parse(unused).is_ok());
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            DiffusionConfig::parse("graph: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = DiffusionConfig::from_file(Path::new("/nonexistent/diffnet.yaml"));
        assert!(matches!(err, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn project_config_loads_if_present() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../diffnet-config.yaml");
        if path.exists() {
            let config = DiffusionConfig::from_file(&path).unwrap();
            assert!(config.n > 0);
            assert!(config.t > 0);
        }
    }
}
