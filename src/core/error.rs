use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{FactionId, UnitId};

/// Why an auto-capture request was refused before any unit was drafted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureRejection {
    /// No capturable land matched the request
    #[error("no capturable cells")]
    NoTargets,
    /// None of the selected units belong to the selecting faction
    #[error("no eligible units selected")]
    NoUnits,
    /// A faction cannot be ordered to capture itself
    #[error("faction {0} cannot capture itself")]
    OwnFaction(FactionId),
}

#[derive(Error, Debug)]
pub enum FrontlineError {
    #[error("Cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    #[error("Unit not found: {0:?}")]
    UnitNotFound(UnitId),

    #[error("Capture rejected: {0}")]
    CaptureRejected(#[from] CaptureRejection),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FrontlineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(CaptureRejection::NoTargets.to_string(), "no capturable cells");
        assert_eq!(CaptureRejection::NoUnits.to_string(), "no eligible units selected");
        assert_eq!(
            CaptureRejection::OwnFaction(FactionId(3)).to_string(),
            "faction 3 cannot capture itself"
        );
    }

    #[test]
    fn test_rejection_converts_and_chains() {
        let err: FrontlineError = CaptureRejection::NoUnits.into();
        assert_eq!(err.to_string(), "Capture rejected: no eligible units selected");
        assert!(matches!(err, FrontlineError::CaptureRejected(CaptureRejection::NoUnits)));
        assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("no eligible units selected"));
    }
}
