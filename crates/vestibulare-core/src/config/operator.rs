//! Operator endpoint configuration.

use serde::{Deserialize, Serialize};

/// Credentials for the privileged operator surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Bearer token that must accompany sweep and broadcast requests.
    ///
    /// An empty token disables the operator endpoints entirely.
    #[serde(default)]
    pub token: String,
}

impl OperatorConfig {
    /// Whether the operator endpoints accept any request at all.
    pub fn is_enabled(&self) -> bool {
        !self.token.is_empty()
    }
}
