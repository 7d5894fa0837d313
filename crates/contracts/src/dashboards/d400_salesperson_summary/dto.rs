use crate::domain::a002_service_task::aggregate::TaskStatus;
use serde::{Deserialize, Serialize};

/// Task counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub will_serve: u64,
    pub cannot_serve: u64,
    pub closed_account: u64,
    pub total: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: TaskStatus, count: u64) {
        match status {
            TaskStatus::Pending => self.pending += count,
            TaskStatus::WillServe => self.will_serve += count,
            TaskStatus::CannotServe => self.cannot_serve += count,
            TaskStatus::ClosedAccount => self.closed_account += count,
        }
        self.total += count;
    }

    pub fn merge(&mut self, other: &StatusCounts) {
        self.pending += other.pending;
        self.will_serve += other.will_serve;
        self.cannot_serve += other.cannot_serve;
        self.closed_account += other.closed_account;
        self.total += other.total;
    }
}

/// One salesperson's row of the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalespersonStats {
    pub id: String,
    pub username: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalespersonSummaryResponse {
    pub salespeople: Vec<SalespersonStats>,
    /// Column sums over all salespeople
    pub summary: StatusCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_includes_every_status() {
        let mut counts = StatusCounts::default();
        counts.add(TaskStatus::Pending, 3);
        counts.add(TaskStatus::WillServe, 2);
        counts.add(TaskStatus::CannotServe, 1);
        counts.add(TaskStatus::ClosedAccount, 4);
        assert_eq!(counts.total, 10);
        assert_eq!(counts.closed_account, 4);
    }
}
