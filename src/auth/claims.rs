use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token payload issued by the external auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,             // user ID
    pub exp: usize,            // expires at (unix timestamp)
    pub aud: String,           // audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,   // issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}
