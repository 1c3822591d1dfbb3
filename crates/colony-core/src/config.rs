//! Configuration loading and typed config structures for the colony engine.
//!
//! The canonical configuration lives in `colony-config.yaml` at the project
//! root. Every section and field has a default, so a missing file or a
//! partial one still yields a runnable colony.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use colony_agents::{AgentError, RepairPolicy, RoleBook, RoleConfig};
use colony_types::{BodyPart, BodyTemplate, Role};

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

    /// A role override failed validation.
    #[error("invalid role table: {source}")]
    Roles {
        /// The validation failure.
        #[from]
        source: AgentError,
    },

    /// A value is out of range or inconsistent.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level colony configuration, mirroring `colony-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColonyConfig {
    /// Run loop timing and bounds.
    #[serde(default)]
    pub world: WorldConfig,

    /// Colony identity.
    #[serde(default)]
    pub colony: ColonySettings,

    /// Population rules, evaluated top to bottom.
    #[serde(default = "default_population")]
    pub population: Vec<PopulationRule>,

    /// Body templates for spawning.
    #[serde(default)]
    pub bodies: BodyConfig,

    /// Role tables replacing the built-in ones.
    #[serde(default)]
    pub roles: Vec<RoleConfig>,

    /// Per-kind repair thresholds, written as single-key maps
    /// (`wall: { absolute: 10000 }`).
    #[serde(
        default,
        deserialize_with = "serde_yml::with::singleton_map_recursive::deserialize"
    )]
    pub repair: RepairPolicy,

    /// Same-tick claim settings.
    #[serde(default)]
    pub claims: ClaimsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            colony: ColonySettings::default(),
            population: default_population(),
            bodies: BodyConfig::default(),
            roles: Vec::new(),
            repair: RepairPolicy::default(),
            claims: ClaimsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ColonyConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for run bounds:
    /// - `COLONY_MAX_TICKS` overrides `world.max_ticks`
    /// - `COLONY_TICK_INTERVAL_MS` overrides `world.tick_interval_ms`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or a
    /// validation error.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or a
    /// validation error.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.world.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for duplicate population roles,
    /// percentages above 100, or empty body templates, and
    /// [`ConfigError::Roles`] for an invalid role override.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for rule in &self.population {
            if !seen.insert(rule.role) {
                return Err(ConfigError::Invalid {
                    reason: format!("population lists {} more than once", rule.role),
                });
            }
            if rule.min_storage_percent.is_some_and(|p| p > 100) {
                return Err(ConfigError::Invalid {
                    reason: format!("{} storage gate is above 100 percent", rule.role),
                });
            }
        }
        if self.bodies.basic.is_empty() || self.bodies.advanced.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "body templates must not be empty".to_owned(),
            });
        }
        self.role_book()?;
        Ok(())
    }

    /// The built-in role tables with this config's overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Roles`] if an override is invalid.
    pub fn role_book(&self) -> Result<RoleBook, ConfigError> {
        Ok(RoleBook::with_overrides(self.roles.clone())?)
    }
}

/// Run loop timing and bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
        }
    }
}

impl WorldConfig {
    /// Override run bounds with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(val) = env_u64("COLONY_MAX_TICKS") {
            self.max_ticks = val;
        }
        if let Some(val) = env_u64("COLONY_TICK_INTERVAL_MS") {
            self.tick_interval_ms = val;
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(val) => Some(val),
        Err(err) => {
            warn!(var = name, value = %raw, %err, "Ignoring malformed environment override");
            None
        }
    }
}

/// Colony identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColonySettings {
    /// Human-readable colony name, used in logs.
    #[serde(default = "default_colony_name")]
    pub name: String,
}

impl Default for ColonySettings {
    fn default() -> Self {
        Self {
            name: default_colony_name(),
        }
    }
}

/// One population rule: keep `threshold` agents of `role` alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PopulationRule {
    /// The role to maintain.
    pub role: Role,

    /// Spawn while fewer than this many are alive.
    pub threshold: u32,

    /// Only spawn when containers hold at least this percent of their
    /// capacity. A colony with no container capacity keeps the gate
    /// closed, so `0 >= 0` never opens it.
    #[serde(default)]
    pub min_storage_percent: Option<u8>,
}

/// Body templates and the energy level that unlocks the larger one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BodyConfig {
    /// Spawn capacity and available energy needed for the advanced body.
    #[serde(default = "default_advanced_energy")]
    pub advanced_energy: u32,

    /// Body used below `advanced_energy` capacity.
    #[serde(default = "default_basic_body")]
    pub basic: BodyTemplate,

    /// Body used once `advanced_energy` is both affordable and available.
    #[serde(default = "default_advanced_body")]
    pub advanced: BodyTemplate,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            advanced_energy: default_advanced_energy(),
            basic: default_basic_body(),
            advanced: default_advanced_body(),
        }
    }
}

/// Same-tick claim settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ClaimsConfig {
    /// Whether agents reserve deposit and withdrawal capacity as they
    /// decide. Disabling it lets two agents pick the same exhausted store.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
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
// Defaults
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    500
}

const fn default_max_ticks() -> u64 {
    0
}

fn default_colony_name() -> String {
    "Colony".to_owned()
}

fn default_population() -> Vec<PopulationRule> {
    vec![
        PopulationRule {
            role: Role::Harvester,
            threshold: 8,
            min_storage_percent: None,
        },
        PopulationRule {
            role: Role::Repairer,
            threshold: 2,
            min_storage_percent: None,
        },
        PopulationRule {
            role: Role::Builder,
            threshold: 4,
            min_storage_percent: Some(85),
        },
        PopulationRule {
            role: Role::Upgrader,
            threshold: 1,
            min_storage_percent: None,
        },
    ]
}

const fn default_advanced_energy() -> u32 {
    550
}

fn default_basic_body() -> BodyTemplate {
    vec![BodyPart::Work, BodyPart::Work, BodyPart::Carry, BodyPart::Move]
}

fn default_advanced_body() -> BodyTemplate {
    vec![
        BodyPart::Work,
        BodyPart::Work,
        BodyPart::Work,
        BodyPart::Carry,
        BodyPart::Carry,
        BodyPart::Carry,
        BodyPart::Move,
    ]
}

const fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colony_agents::RepairThreshold;
    use colony_types::{SiteKind, Task};

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ColonyConfig::default();
        config.validate().unwrap();
        assert_eq!(config.population.len(), 4);
        assert_eq!(config.bodies.advanced_energy, 550);
        assert!(config.claims.enabled);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
world:
  tick_interval_ms: 250
  max_ticks: 40
colony:
  name: Outpost
population:
  - role: harvester
    threshold: 6
  - role: builder
    threshold: 3
    min_storage_percent: 50
bodies:
  advanced_energy: 400
  basic: [work, carry, move]
  advanced: [work, work, carry, carry, move]
roles:
  - role: upgrader
    gathering:
      - task: harvest
        targets: [[source]]
    consuming:
      - task: upgrade
        targets: [[controller]]
    resting: rally
repair:
  wall:
    absolute: 2000
  road:
    percent: 60
claims:
  enabled: false
logging:
  level: debug
";
        let config = ColonyConfig::parse(yaml).unwrap();
        assert_eq!(config.colony.name, "Outpost");
        assert_eq!(config.population.len(), 2);
        assert_eq!(
            config.population[1].min_storage_percent,
            Some(50)
        );
        assert_eq!(config.bodies.basic, vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move]);
        assert_eq!(
            config.repair.threshold(SiteKind::Wall),
            Some(RepairThreshold::Absolute(2_000))
        );
        assert!(!config.claims.enabled);
        assert_eq!(config.logging.level, "debug");

        let book = config.role_book().unwrap();
        assert_eq!(book.get(Role::Upgrader).resting, Task::Rally);
    }

    #[test]
    fn shipped_config_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../colony-config.yaml");
        let config = ColonyConfig::from_file(&path).unwrap();

        assert_eq!(config.colony.name, "Sandbox");
        assert_eq!(config.population, default_population());
        assert_eq!(config.repair, RepairPolicy::default());
        assert_eq!(
            config.repair.threshold(SiteKind::Road),
            Some(RepairThreshold::Percent(100))
        );
        assert!(config.claims.enabled);
        config.role_book().unwrap();
    }

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = ColonyConfig::parse("{}").unwrap();
        assert_eq!(config.population, default_population());
        assert_eq!(config.world.tick_interval_ms, 500);
    }

    #[test]
    fn duplicate_population_role_is_rejected() {
        let yaml = r"
population:
  - role: harvester
    threshold: 2
  - role: harvester
    threshold: 4
";
        assert!(matches!(
            ColonyConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn invalid_role_override_is_rejected() {
        let yaml = r"
roles:
  - role: builder
    gathering: []
    consuming:
      - task: build
        targets: [[construction_site]]
    resting: rally
";
        assert!(matches!(
            ColonyConfig::parse(yaml),
            Err(ConfigError::Roles { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = ColonyConfig::from_file(Path::new("/nonexistent/colony-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
