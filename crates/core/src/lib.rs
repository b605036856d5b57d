#![forbid(unsafe_code)]

pub mod status {
    /// Lifecycle of a site-visit job. The only forward path is
    /// `pending -> in_progress -> completed`; the daily reset returns
    /// completed jobs to `pending`. There is no cancel transition.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum JobStatus {
        Pending,
        InProgress,
        Completed,
    }

    impl JobStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Pending => "pending",
                Self::InProgress => "in_progress",
                Self::Completed => "completed",
            }
        }

        pub fn parse(value: &str) -> Result<Self, JobStatusError> {
            match value.trim() {
                "pending" => Ok(Self::Pending),
                "in_progress" => Ok(Self::InProgress),
                "completed" => Ok(Self::Completed),
                _ => Err(JobStatusError::Unknown),
            }
        }

        /// Starting is legal from `pending`. Starting an `in_progress` job is
        /// an idempotent no-op at the store layer, not a transition.
        pub fn can_start(self) -> bool {
            matches!(self, Self::Pending)
        }

        /// Finishing is legal only from `in_progress`.
        pub fn can_finish(self) -> bool {
            matches!(self, Self::InProgress)
        }

        pub fn is_terminal(self) -> bool {
            matches!(self, Self::Completed)
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum JobStatusError {
        Unknown,
    }

    impl std::fmt::Display for JobStatusError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Unknown => write!(f, "unknown job status"),
            }
        }
    }

    impl std::error::Error for JobStatusError {}
}

pub mod roles {
    /// Caller identity as resolved by the role gate. `id` is the chat-platform
    /// user id; `name` is the display name used on notes.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Actor {
        pub id: i64,
        pub name: String,
        pub role: Role,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Role {
        Dev,
        Director,
        Employee,
        Generic,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Operation {
        ViewJob,
        StartJob,
        FinishJob,
        AddPhoto,
        AddNote,
        ListUnassigned,
        AssignJobs,
        ResetJobs,
    }

    impl Role {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Dev => "Dev",
                Self::Director => "Director",
                Self::Employee => "Employee",
                Self::Generic => "Generic",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value.trim() {
                "Dev" => Some(Self::Dev),
                "Director" => Some(Self::Director),
                "Employee" => Some(Self::Employee),
                "Generic" => Some(Self::Generic),
                _ => None,
            }
        }

        /// The single permission table. Every request consults this once;
        /// there is no other role dispatch anywhere in the system.
        pub fn permits(self, operation: Operation) -> bool {
            use Operation::*;
            match self {
                Self::Dev => true,
                Self::Director => matches!(
                    operation,
                    ViewJob | AddNote | ListUnassigned | AssignJobs | ResetJobs
                ),
                Self::Employee => {
                    matches!(operation, ViewJob | StartJob | FinishJob | AddPhoto | AddNote)
                }
                Self::Generic => false,
            }
        }
    }
}

pub mod selection {
    use std::collections::BTreeSet;

    /// Transient, session-scoped set of job ids chosen for a bulk assignment.
    /// Owned by the caller's session context, never by process-wide state.
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct SelectionSet {
        ids: BTreeSet<i64>,
    }

    impl SelectionSet {
        pub fn new() -> Self {
            Self::default()
        }

        /// Toggling twice returns the set to its original state. Returns
        /// whether the id is selected after the call.
        pub fn toggle(&mut self, job_id: i64) -> bool {
            if self.ids.remove(&job_id) {
                false
            } else {
                self.ids.insert(job_id);
                true
            }
        }

        pub fn contains(&self, job_id: i64) -> bool {
            self.ids.contains(&job_id)
        }

        pub fn clear(&mut self) {
            self.ids.clear();
        }

        pub fn is_empty(&self) -> bool {
            self.ids.is_empty()
        }

        pub fn len(&self) -> usize {
            self.ids.len()
        }

        pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
            self.ids.iter().copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::roles::{Operation, Role};
    use super::selection::SelectionSet;
    use super::status::JobStatus;

    #[test]
    fn status_round_trips() {
        for status in [
            JobStatus::Pending,
            JobStatus::InProgress,
            JobStatus::Completed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Ok(status));
        }
        assert!(JobStatus::parse("done").is_err());
    }

    #[test]
    fn transitions_follow_the_lifecycle() {
        assert!(JobStatus::Pending.can_start());
        assert!(!JobStatus::Pending.can_finish());
        assert!(!JobStatus::InProgress.can_start());
        assert!(JobStatus::InProgress.can_finish());
        assert!(!JobStatus::Completed.can_start());
        assert!(!JobStatus::Completed.can_finish());
    }

    #[test]
    fn permission_table_by_role() {
        use Operation::*;

        for op in [
            ViewJob,
            StartJob,
            FinishJob,
            AddPhoto,
            AddNote,
            ListUnassigned,
            AssignJobs,
            ResetJobs,
        ] {
            assert!(Role::Dev.permits(op));
            assert!(!Role::Generic.permits(op));
        }

        assert!(Role::Director.permits(AssignJobs));
        assert!(Role::Director.permits(ListUnassigned));
        assert!(Role::Director.permits(ResetJobs));
        assert!(!Role::Director.permits(StartJob));
        assert!(!Role::Director.permits(FinishJob));
        assert!(!Role::Director.permits(AddPhoto));

        assert!(Role::Employee.permits(StartJob));
        assert!(Role::Employee.permits(FinishJob));
        assert!(Role::Employee.permits(AddPhoto));
        assert!(!Role::Employee.permits(AssignJobs));
        assert!(!Role::Employee.permits(ResetJobs));
    }

    #[test]
    fn selection_toggle_is_idempotent_in_pairs() {
        let mut selection = SelectionSet::new();
        assert!(selection.toggle(7));
        assert!(selection.contains(7));
        assert!(!selection.toggle(7));
        assert!(selection.is_empty());

        selection.toggle(3);
        selection.toggle(1);
        selection.toggle(2);
        let ids: Vec<i64> = selection.ids().collect();
        assert_eq!(ids, vec![1, 2, 3]);

        selection.clear();
        assert!(selection.is_empty());
    }
}
