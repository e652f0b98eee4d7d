//! Trustbed run configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trustbed_broker::SimulationConfig;
use trustbed_common::{Result, TrustbedError};
use trustbed_darwinian::classifier::kernel::DEFAULT_MAX_SUPPORT;
use trustbed_darwinian::{Hyperparameters, SearchConfig};
use trustbed_ledger::{BootstrapConfig, PopulationConfig};

/// Environment prefix for overrides, e.g. `TRUSTBED__POPULATION__NODE_COUNT`
const ENV_PREFIX: &str = "TRUSTBED";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_VAR: &str = "TRUSTBED_CONFIG";

/// Which classifiers the run trains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    /// One tuned model per reporter
    PerReporter,
    /// One model over every reporter's reports
    Shared,
}

/// Full run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustbedConfig {
    /// Master seed
    pub seed: u64,
    /// Generate fresh report logs; otherwise reuse the existing ones
    pub generate: bool,
    pub classifier: ClassifierMode,
    /// Hyperparameters of the shared model
    pub shared: SharedModelSettings,
    /// Support samples kept per kernel model
    pub max_support: usize,
    pub population: PopulationConfig,
    pub bootstrap: BootstrapConfig,
    pub search: SearchConfig,
    pub simulation: SimulationConfig,
    pub paths: PathSettings,
}

impl Default for TrustbedConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            generate: true,
            classifier: ClassifierMode::PerReporter,
            shared: SharedModelSettings::default(),
            max_support: DEFAULT_MAX_SUPPORT,
            population: PopulationConfig::default(),
            bootstrap: BootstrapConfig::default(),
            search: SearchConfig::default(),
            simulation: SimulationConfig::default(),
            paths: PathSettings::default(),
        }
    }
}

impl TrustbedConfig {
    /// Load from `.env`, the configuration file and `TRUSTBED__*` variables
    ///
    /// The file is `$TRUSTBED_CONFIG` when set, otherwise an optional
    /// `trustbed.{toml,json,yaml}` in the working directory.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let explicit = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        Self::load_from(explicit.as_deref())
    }

    /// Load with an explicit file (required when given)
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("trustbed").required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| TrustbedError::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| TrustbedError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.population.validate()?;
        self.bootstrap.targets.validate()?;
        self.search.validate()?;
        self.simulation.validate()?;
        self.shared.validate()?;

        if self.generate && self.bootstrap.epochs == 0 {
            return Err(TrustbedError::Config(
                "bootstrap.epochs must be positive when generating".to_string(),
            ));
        }
        if self.max_support == 0 {
            return Err(TrustbedError::Config(
                "max_support must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fixed hyperparameters of the shared model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedModelSettings {
    pub regularization: f64,
    pub kernel_width: f64,
}

impl Default for SharedModelSettings {
    fn default() -> Self {
        Self {
            regularization: 5.0,
            kernel_width: 0.1,
        }
    }
}

impl SharedModelSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.regularization > 0.0 && self.kernel_width > 0.0) {
            return Err(TrustbedError::Config(format!(
                "shared model hyperparameters must be positive, got C={} gamma={}",
                self.regularization, self.kernel_width
            )));
        }
        Ok(())
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            regularization: self.regularization,
            kernel_width: self.kernel_width,
        }
    }
}

/// Output locations; file names are relative to `data_dir`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub data_dir: PathBuf,
    pub train_log: String,
    pub test_log: String,
    pub hyperparameter_log: String,
    pub state_file: String,
    pub model_dir: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            train_log: "reports-train.csv".to_string(),
            test_log: "reports-test.csv".to_string(),
            hyperparameter_log: "hyperparameters.csv".to_string(),
            state_file: "state.json".to_string(),
            model_dir: "models".to_string(),
        }
    }
}

impl PathSettings {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn train_log(&self) -> PathBuf {
        self.data_dir.join(&self.train_log)
    }

    pub fn test_log(&self) -> PathBuf {
        self.data_dir.join(&self.test_log)
    }

    pub fn hyperparameter_log(&self) -> PathBuf {
        self.data_dir.join(&self.hyperparameter_log)
    }

    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join(&self.state_file)
    }

    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join(&self.model_dir)
    }
}
