// core/src/error.rs
use thiserror::Error;

/// Feiltyper for kjernen.
///
/// "Ikke beregnbar" er ingen feil: det er `None` fra vindusberegningen.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Ødelagt serie (duplikate/synkende offsets, negative eller ikke-finite verdier).
    #[error("data integrity error for activity {activity_id}: {reason}")]
    DataIntegrity { activity_id: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Lagring eller strøm-leverandør svarte ikke (I/O).
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    pub fn data_integrity(activity_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::DataIntegrity {
            activity_id: activity_id.into(),
            reason: reason.into(),
        }
    }

    /// Kort etikett for logging og metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::DataIntegrity { .. } => "data_integrity",
            CoreError::NotFound(_) => "not_found",
            CoreError::CollaboratorUnavailable(_) => "collaborator_unavailable",
            CoreError::InvalidConfig(_) => "invalid_config",
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::CollaboratorUnavailable(format!("io: {e}"))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::CollaboratorUnavailable(format!("json: {e}"))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
