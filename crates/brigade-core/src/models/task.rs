use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Task workflow status. Transitions are restricted to the table in
/// [`TaskStatus::can_transition_to`]; everything else is rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "task_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Ready,
    Approved,
    Rework,
}

impl TaskStatus {
    /// Allowed moves: todo -> in_progress -> ready -> approved, with
    /// ready -> rework -> in_progress as the loop back.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Todo, InProgress) | (InProgress, Ready) | (Ready, Approved) | (Ready, Rework) | (Rework, InProgress)
        )
    }

    /// Approved tasks accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Approved)
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Ready => write!(f, "ready"),
            TaskStatus::Approved => write!(f, "approved"),
            TaskStatus::Rework => write!(f, "rework"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "ready" => Ok(TaskStatus::Ready),
            "approved" => Ok(TaskStatus::Approved),
            "rework" => Ok(TaskStatus::Rework),
            _ => Err(anyhow::anyhow!("Invalid task status: {}", s)),
        }
    }
}

/// Work item scoped to exactly one company, optionally one project of the
/// same company. Never hard-deleted; `deleted_at` hides it from every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Task {
    pub id: Uuid,
    pub company_id: Uuid,
    pub project_id: Option<Uuid>,
    /// Chat id of the assignee, if any.
    pub assignee_chat_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_allowed() {
        assert!(TaskStatus::Todo.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Ready));
        assert!(TaskStatus::Ready.can_transition_to(TaskStatus::Approved));
    }

    #[test]
    fn rework_loop_is_allowed() {
        assert!(TaskStatus::Ready.can_transition_to(TaskStatus::Rework));
        assert!(TaskStatus::Rework.can_transition_to(TaskStatus::InProgress));
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert!(!TaskStatus::Todo.can_transition_to(TaskStatus::Ready));
        assert!(!TaskStatus::Todo.can_transition_to(TaskStatus::Approved));
        assert!(!TaskStatus::InProgress.can_transition_to(TaskStatus::Approved));
    }

    #[test]
    fn moving_backwards_is_rejected() {
        assert!(!TaskStatus::Ready.can_transition_to(TaskStatus::Todo));
        assert!(!TaskStatus::InProgress.can_transition_to(TaskStatus::Todo));
        assert!(!TaskStatus::Rework.can_transition_to(TaskStatus::Ready));
    }

    #[test]
    fn approved_is_terminal() {
        assert!(TaskStatus::Approved.is_terminal());
        for next in [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Ready,
            TaskStatus::Rework,
        ] {
            assert!(!TaskStatus::Approved.can_transition_to(next));
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Ready,
            TaskStatus::Approved,
            TaskStatus::Rework,
        ] {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Ready,
            TaskStatus::Approved,
            TaskStatus::Rework,
        ] {
            assert_eq!(status.to_string().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("done".parse::<TaskStatus>().is_err());
    }
}
