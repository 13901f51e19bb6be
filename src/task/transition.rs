//! Status transition guard.
//!
//! Pure function over [`TaskStatus`] pairs. Edges only move forward one step:
//!
//! ```text
//! NOT_STARTED -> IN_PROGRESS -> COMPLETED
//! ```
//!
//! Requesting the current status succeeds without change.

use super::task::{TaskError, TaskStatus};

/// Statuses reachable in one step from `from`.
pub fn allowed_next(from: TaskStatus) -> &'static [TaskStatus] {
    match from {
        TaskStatus::NotStarted => &[TaskStatus::InProgress],
        TaskStatus::InProgress => &[TaskStatus::Completed],
        TaskStatus::Completed => &[],
    }
}

/// Validate a move from `current` to `requested`.
///
/// # Errors
/// `TaskError::InvalidTransition` naming both states for any skipped,
/// backward, or out-of-terminal move.
pub fn transition(current: TaskStatus, requested: TaskStatus) -> Result<TaskStatus, TaskError> {
    if current == requested || allowed_next(current).contains(&requested) {
        Ok(requested)
    } else {
        Err(TaskError::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        let allowed = [
            (TaskStatus::NotStarted, TaskStatus::InProgress),
            (TaskStatus::InProgress, TaskStatus::Completed),
        ];
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                let result = transition(from, to);
                if from == to || allowed.contains(&(from, to)) {
                    assert_eq!(result, Ok(to), "{} -> {} should be allowed", from, to);
                } else {
                    assert_eq!(
                        result,
                        Err(TaskError::InvalidTransition { from, to }),
                        "{} -> {} should be rejected",
                        from,
                        to
                    );
                }
            }
        }
    }

    #[test]
    fn test_same_status_is_idempotent() {
        for status in TaskStatus::ALL {
            assert_eq!(transition(status, status), Ok(status));
        }
    }

    #[test]
    fn test_completed_is_terminal() {
        assert!(allowed_next(TaskStatus::Completed).is_empty());
        assert!(TaskStatus::Completed.is_terminal());
        let err = transition(TaskStatus::Completed, TaskStatus::InProgress).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition from COMPLETED to IN_PROGRESS"
        );
    }
}
