//! Exit code logic for the streamget process.
//!
//! Single responsibility: map the download result to the process exit outcome
//! and write the diagnostic line for failures.

use streamget_core::{DownloadError, DownloadOutcome, ErrorKind};
use tracing::info;

use crate::ProcessExit;

/// Determines the process exit outcome for a finished download.
pub(crate) fn determine_exit_outcome(result: &Result<DownloadOutcome, DownloadError>) -> ProcessExit {
    match result {
        Ok(_) => ProcessExit::Success,
        Err(error) if error.kind() == ErrorKind::Cancelled => ProcessExit::Interrupted,
        Err(_) => ProcessExit::Failure,
    }
}

/// Logs success or prints the failure to stderr, then returns the exit outcome.
pub(crate) fn report_outcome(result: &Result<DownloadOutcome, DownloadError>) -> ProcessExit {
    match result {
        Ok(outcome) => info!(
            path = %outcome.path.display(),
            bytes = outcome.bytes_transferred,
            "Download finished"
        ),
        Err(error) => eprintln!("{}", failure_message(error)),
    }
    determine_exit_outcome(result)
}

pub(crate) fn failure_message(error: &DownloadError) -> String {
    format!("error [{}]: {error}", error.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn ok() -> Result<DownloadOutcome, DownloadError> {
        Ok(DownloadOutcome {
            path: PathBuf::from("out.zip"),
            bytes_transferred: 3,
            total_bytes: Some(3),
        })
    }

    #[test]
    fn test_exit_outcome_success() {
        assert_eq!(determine_exit_outcome(&ok()), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_cancelled_is_interrupted() {
        let result = Err(DownloadError::cancelled("https://example.com/a", 0));
        assert_eq!(determine_exit_outcome(&result), ProcessExit::Interrupted);
    }

    #[test]
    fn test_exit_outcome_timeout_and_http_errors_fail() {
        let timeout = Err(DownloadError::timeout("https://example.com/a", Duration::from_secs(1), 0));
        let status = Err(DownloadError::http_status("https://example.com/a", 500));
        assert_eq!(determine_exit_outcome(&timeout), ProcessExit::Failure);
        assert_eq!(determine_exit_outcome(&status), ProcessExit::Failure);
    }

    #[test]
    fn test_failure_message_includes_kind_label() {
        let error = DownloadError::http_status("https://example.com/a", 404);
        assert_eq!(
            failure_message(&error),
            "error [connect-failure]: HTTP 404 downloading https://example.com/a"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Failure.code(), 1);
        assert_eq!(ProcessExit::Interrupted.code(), 130);
    }
}
