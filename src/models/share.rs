use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Access mode carried by a grant. Only read access exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMode {
    Read,
}

impl ShareMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareMode::Read => "read",
        }
    }
}

/// Read grant on one file from its owner to another user
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShareGrant {
    pub id: String,
    pub file_id: String,
    pub granted_by: String,
    pub granted_to: String,
    pub mode: String,
    pub granted_at: String,
}

/// Request to share a file
#[derive(Debug, Deserialize)]
pub struct CreateShareRequest {
    pub target_user_id: String,
}
