use serde::{Deserialize, Serialize};

/// Request body for creating or renaming a profile.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
}
