use log::info;

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;

use super::format;

/// High-level storage operations: save/load a portfolio snapshot to/from bytes or files.
pub struct StorageManager;

impl StorageManager {
    /// Serialize a portfolio to snapshot bytes (portable, platform-independent).
    ///
    /// Flow: Portfolio → bincode → PTRK framing
    pub fn save_to_bytes(portfolio: &Portfolio) -> Result<Vec<u8>, CoreError> {
        let payload = bincode::serialize(portfolio)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize portfolio: {e}")))?;
        Ok(format::write_file(format::CURRENT_VERSION, &payload))
    }

    /// Deserialize a portfolio from snapshot bytes.
    pub fn load_from_bytes(data: &[u8]) -> Result<Portfolio, CoreError> {
        let (header, payload) = format::read_file(data)?;
        let portfolio: Portfolio = bincode::deserialize(payload).map_err(|e| {
            CoreError::Deserialization(format!("Failed to deserialize portfolio: {e}"))
        })?;
        info!(
            "Loaded snapshot v{} with {} transactions and {} corporate events",
            header.version,
            portfolio.transactions.len(),
            portfolio.corporate_events.len()
        );
        Ok(portfolio)
    }

    /// Save a snapshot file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(portfolio: &Portfolio, path: &str) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(portfolio)?;
        std::fs::write(path, bytes)?;
        info!("Saved portfolio snapshot to {path}");
        Ok(())
    }

    /// Load a snapshot file from disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str) -> Result<Portfolio, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes)
    }
}
