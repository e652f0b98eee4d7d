//! Versioned simulation state
//!
//! Plain data only: configuration, network, roster and the latest report
//! matrix. Trained classifiers are stored separately as opaque blobs and
//! referenced here by key, so the schema never depends on a model's internal
//! format.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use trustbed_common::{Result, TrustbedError, STATE_SCHEMA_VERSION};
use uuid::Uuid;

use crate::matrix::ReportMatrix;
use crate::population::builder::{Population, Roster};
use crate::population::network::Network;
use crate::{BootstrapConfig, PopulationConfig};

/// Reference to an opaque model blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelBlobRef {
    /// Blob key, e.g. `reporter-7`
    pub key: String,
    /// blake3 hex digest of the blob bytes
    pub checksum: String,
}

/// Snapshot of one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    pub schema_version: u32,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Master seed of the run
    pub seed: u64,
    pub population: PopulationConfig,
    pub bootstrap: BootstrapConfig,
    pub network: Network,
    pub roster: Roster,
    /// Latest training-corpus report per pair
    pub matrix: ReportMatrix,
    pub models: Vec<ModelBlobRef>,
}

impl SimulationState {
    pub fn new(
        seed: u64,
        population_config: PopulationConfig,
        bootstrap: BootstrapConfig,
        population: Population,
        matrix: ReportMatrix,
    ) -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            run_id: Uuid::now_v7(),
            created_at: Utc::now(),
            seed,
            population: population_config,
            bootstrap,
            network: population.network,
            roster: population.roster,
            matrix,
            models: Vec::new(),
        }
    }

    /// Record a model blob, replacing any previous blob with the same key
    pub fn register_model(&mut self, blob: ModelBlobRef) {
        self.models.retain(|m| m.key != blob.key);
        self.models.push(blob);
    }

    pub fn model(&self, key: &str) -> Option<&ModelBlobRef> {
        self.models.iter().find(|m| m.key == key)
    }

    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .map_err(|e| TrustbedError::Storage(format!("{}: {}", path.display(), e)))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        info!(path = %path.display(), "Saved simulation state");
        Ok(())
    }

    /// Load a snapshot, rejecting other schema versions
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| TrustbedError::Storage(format!("{}: {}", path.display(), e)))?;
        let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;

        let version = value
            .get("schema_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| {
                TrustbedError::Serialization(format!(
                    "{}: missing schema_version",
                    path.display()
                ))
            })?;
        if version != u64::from(STATE_SCHEMA_VERSION) {
            return Err(TrustbedError::Config(format!(
                "{}: unsupported state schema version {} (expected {})",
                path.display(),
                version,
                STATE_SCHEMA_VERSION
            )));
        }

        let state: SimulationState = serde_json::from_value(value)?;
        if state.network.len() != state.matrix.size() {
            return Err(TrustbedError::Serialization(format!(
                "{}: network of {} nodes with a {}x{} matrix",
                path.display(),
                state.network.len(),
                state.matrix.size(),
                state.matrix.size()
            )));
        }
        Ok(state)
    }
}
