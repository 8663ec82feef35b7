//! Import and sync operation logs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Long-running background operation that can be stopped by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Import,
    Sync,
}

impl OperationKind {
    pub fn table(&self) -> &'static str {
        match self {
            OperationKind::Import => "import_logs",
            OperationKind::Sync => "sync_logs",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Import => "Import",
            OperationKind::Sync => "Sync",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    InProgress,
    Completed,
    Failed,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::InProgress => "in_progress",
            OperationStatus::Completed => "completed",
            OperationStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopImportRequest {
    pub import_log_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSyncRequest {
    pub sync_log_id: Uuid,
}

/// Result of a stop request. Always successful; `stopped` tells whether a
/// running operation was actually marked failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopOperationResponse {
    pub success: bool,
    pub stopped: bool,
    pub message: String,
}

impl StopOperationResponse {
    pub fn from_rows_affected(kind: OperationKind, rows_affected: u64) -> Self {
        let stopped = rows_affected > 0;
        let message = if stopped {
            format!("{} stopped", kind.label())
        } else {
            format!("No running {} found", kind.label().to_lowercase())
        };
        Self {
            success: true,
            stopped,
            message,
        }
    }
}
