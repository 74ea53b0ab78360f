use thiserror::Error;

use crate::TaskId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedError {
    /// The task was aborted before producing its output.
    #[error("{0} was aborted before completing")]
    Aborted(TaskId),

    /// A guarded suspension observed a cancellation signal.
    #[error("operation interrupted by cancellation")]
    Interrupted,
}

pub type SchedResult<T> = Result<T, SchedError>;
