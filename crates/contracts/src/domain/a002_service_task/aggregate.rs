use crate::domain::a001_client::aggregate::{Client, ClientId};
use crate::domain::common::AggregateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceTaskId(pub Uuid);

impl ServiceTaskId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl AggregateId for ServiceTaskId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Status
// ============================================================================

/// Lifecycle of a service task (atendimento).
///
/// Portuguese codes used by earlier clients are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[serde(alias = "PENDENTE")]
    Pending,
    #[serde(alias = "VAI_ATENDER")]
    WillServe,
    #[serde(alias = "NAO_CONSIGO_ATENDER")]
    CannotServe,
    #[serde(alias = "FECHOU_CNPJ")]
    ClosedAccount,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::WillServe,
        TaskStatus::CannotServe,
        TaskStatus::ClosedAccount,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::WillServe => "WILL_SERVE",
            TaskStatus::CannotServe => "CANNOT_SERVE",
            TaskStatus::ClosedAccount => "CLOSED_ACCOUNT",
        }
    }

    /// Statuses a salesperson may answer a pending task with.
    pub fn is_response(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PENDING" | "PENDENTE" => Ok(TaskStatus::Pending),
            "WILL_SERVE" | "VAI_ATENDER" => Ok(TaskStatus::WillServe),
            "CANNOT_SERVE" | "NAO_CONSIGO_ATENDER" => Ok(TaskStatus::CannotServe),
            "CLOSED_ACCOUNT" | "FECHOU_CNPJ" => Ok(TaskStatus::ClosedAccount),
            other => Err(format!("Unknown task status: {}", other)),
        }
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Comparison flag value marking a client for re-review
pub const REVIEW_FLAG: &str = "VER";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTask {
    pub id: ServiceTaskId,
    pub client_id: ClientId,
    pub salesperson_id: String,
    pub revenue: f64,
    pub comparison_flag: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl ServiceTask {
    /// New task in PENDING state, stamped now
    pub fn new_pending(draft: NewServiceTask, client_id: ClientId) -> Self {
        Self {
            id: ServiceTaskId::new_v4(),
            client_id,
            salesperson_id: draft.salesperson_id,
            revenue: draft.revenue,
            comparison_flag: draft.comparison_flag,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.salesperson_id == user_id
    }

    pub fn respond(&mut self, status: TaskStatus) -> Result<(), String> {
        if !status.is_response() {
            return Err(format!("Invalid status: {}", status));
        }
        self.status = status;
        self.responded_at = Some(Utc::now());
        Ok(())
    }

    pub fn attention_reason(&self) -> Option<AttentionReason> {
        AttentionReason::classify(&self.comparison_flag, self.revenue)
    }
}

/// Task fields known before the client row exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewServiceTask {
    pub salesperson_id: String,
    pub revenue: f64,
    pub comparison_flag: String,
}

/// Why a pending task was raised, shown next to it in the salesperson's list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttentionReason {
    /// Comparison flag "VER": client outside the salesperson's region
    OutsideRegion,
    /// No sales in the imported period
    NoRecentSales,
}

impl AttentionReason {
    pub fn classify(comparison_flag: &str, revenue: f64) -> Option<Self> {
        if comparison_flag.trim().eq_ignore_ascii_case(REVIEW_FLAG) {
            Some(AttentionReason::OutsideRegion)
        } else if revenue == 0.0 {
            Some(AttentionReason::NoRecentSales)
        } else {
            None
        }
    }
}

// ============================================================================
// DTO
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    /// Raw status code; validated server-side so unknown values map to a 400
    pub status: String,
}

/// Pending task with its client, as listed for the owning salesperson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingServiceTask {
    #[serde(flatten)]
    pub task: ServiceTask,
    pub client: Client,
    pub attention_reason: Option<AttentionReason>,
}

impl PendingServiceTask {
    pub fn new(task: ServiceTask, client: Client) -> Self {
        let attention_reason = task.attention_reason();
        Self {
            task,
            client,
            attention_reason,
        }
    }
}
