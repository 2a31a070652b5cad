//! DTOs for the health endpoint.

use serde::Serialize;

/// Overall service health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when every check passes, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// The ledger store answers a ping.
    pub database: CheckStatus,
    /// The configured key can seal and open a token.
    pub tokens: CheckStatus,
}

#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl CheckStatus {
    pub fn ok(message: &'static str) -> Self {
        Self {
            status: "ok",
            message: Some(message),
        }
    }

    pub fn error(message: &'static str) -> Self {
        Self {
            status: "error",
            message: Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
