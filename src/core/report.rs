/// Result reporting for the dispatch layer.
///
/// Every operation returns `Result<T>`. Callers that hand results to an
/// external dispatcher wrap them in an [`Outcome`] so success and failure
/// serialize the same way regardless of the operation.
use crate::core::{DataError, ErrorKind, Result};
use serde::Serialize;
use tracing::error;

/// Uniform success/failure envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Success { data: T },
    Failure { kind: ErrorKind, message: String },
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Success { data } => Some(data),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Outcome::Success { data },
            Err(e) => Outcome::Failure {
                kind: e.kind(),
                message: e.message().to_string(),
            },
        }
    }
}

/// Wraps an operation's result, logging the failure if there is one.
pub fn report<T>(operation: &str, result: Result<T>) -> Outcome<T> {
    if let Err(e) = &result {
        log_failure(operation, e);
    }
    Outcome::from(result)
}

fn log_failure(operation: &str, e: &DataError) {
    error!(operation, kind = ?e.kind(), "{}", e.message());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serialization() {
        let outcome = report("list_tables", Ok(vec!["users".to_string()]));
        assert!(outcome.is_success());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status": "success", "data": ["users"]})
        );
    }

    #[test]
    fn test_failure_serialization() {
        let outcome: Outcome<Vec<String>> =
            report("insert_multiple_rows", Err(DataError::empty_input("no rows to insert")));
        assert_eq!(outcome.kind(), Some(ErrorKind::EmptyInputFailure));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status": "failure", "kind": "empty_input_failure", "message": "no rows to insert"})
        );
    }

    #[test]
    fn test_empty_success_is_not_failure() {
        let outcome: Outcome<Vec<String>> = report("get_all_rows", Ok(Vec::new()));
        assert!(outcome.is_success());
        assert_eq!(outcome.data().map(Vec::len), Some(0));
    }
}
