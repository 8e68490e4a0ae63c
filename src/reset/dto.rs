use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequestBody {
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetBody {
    pub token: Option<String>,
    pub new_password: Option<String>,
}

/// Outcome of a reset request as seen by the caller.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ResetRequestResponse {
    /// The token went out by email (`sent: true`) or was withheld (`sent: false`).
    Dispatched { ok: bool, sent: bool },
    /// No email went out and the token is handed back directly.
    Token { token: String, expiry: String },
}
