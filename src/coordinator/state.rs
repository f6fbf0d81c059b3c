use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UploadState {
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "hashing")]
    Hashing,
    #[serde(rename = "starting")]
    Starting,
    #[serde(rename = "resuming")]
    Resuming,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "paused")]
    Paused,
    /// Every part is confirmed and the session is being finalized.
    #[serde(rename = "completing")]
    Completing,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "failed")]
    Failed,
}

impl UploadState {
    /// An attempt is running and can be paused or cancelled.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            UploadState::Hashing
                | UploadState::Starting
                | UploadState::Resuming
                | UploadState::Uploading
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadState::Completed | UploadState::Cancelled | UploadState::Failed
        )
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadState::Idle => write!(f, "idle"),
            UploadState::Hashing => write!(f, "hashing"),
            UploadState::Starting => write!(f, "starting"),
            UploadState::Resuming => write!(f, "resuming"),
            UploadState::Uploading => write!(f, "uploading"),
            UploadState::Paused => write!(f, "paused"),
            UploadState::Completing => write!(f, "completing"),
            UploadState::Completed => write!(f, "completed"),
            UploadState::Cancelled => write!(f, "cancelled"),
            UploadState::Failed => write!(f, "failed"),
        }
    }
}

impl From<&str> for UploadState {
    fn from(value: &str) -> Self {
        match value {
            "hashing" => UploadState::Hashing,
            "starting" => UploadState::Starting,
            "resuming" => UploadState::Resuming,
            "uploading" => UploadState::Uploading,
            "paused" => UploadState::Paused,
            "completing" => UploadState::Completing,
            "completed" => UploadState::Completed,
            "cancelled" => UploadState::Cancelled,
            "failed" => UploadState::Failed,
            _ => UploadState::Idle,
        }
    }
}
