//! Typed error hierarchy for tackboard.
//!
//! Three enums cover the three layers:
//! - `BoardError` - persistence and validation failures raised by `board::db`
//!   and the HTTP handlers
//! - `OrderingError` - drop targets the position resolver cannot place
//! - `ClientError` - failures talking to a running board server

use thiserror::Error;

/// Errors from the persistence layer and request validation.
///
/// `board::db` returns `anyhow::Result`; these variants travel inside the
/// `anyhow::Error` and are recovered with `downcast_ref` where a caller needs
/// to tell a missing row from a broken database.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Column {id} not found")]
    ColumnNotFound { id: i64 },

    #[error("Card {id} not found")]
    CardNotFound { id: i64 },

    #[error("Member {id} not found")]
    MemberNotFound { id: i64 },

    #[error("Cannot delete the last column")]
    LastColumn,

    #[error("{0}")]
    Validation(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl BoardError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for the variants that name a row that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ColumnNotFound { .. } | Self::CardNotFound { .. } | Self::MemberNotFound { .. }
        )
    }
}

/// Errors from resolving a drag gesture into an order plan.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderingError {
    #[error("Card {0} is not on the board")]
    UnknownCard(i64),

    #[error("Column {0} is not on the board")]
    UnknownColumn(i64),
}

/// Errors from `board::client::BoardClient`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid drop: {0}")]
    InvalidDrop(#[from] OrderingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_error_column_not_found_carries_id() {
        let err = BoardError::ColumnNotFound { id: 42 };
        match &err {
            BoardError::ColumnNotFound { id } => assert_eq!(*id, 42),
            _ => panic!("Expected ColumnNotFound"),
        }
        assert_eq!(err.to_string(), "Column 42 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn board_error_last_column_message() {
        let err = BoardError::LastColumn;
        assert_eq!(err.to_string(), "Cannot delete the last column");
        assert!(!err.is_not_found());
    }

    #[test]
    fn board_error_validation_displays_message_verbatim() {
        let err = BoardError::validation("Title is required");
        assert_eq!(err.to_string(), "Title is required");
    }

    #[test]
    fn board_error_survives_anyhow_roundtrip() {
        let err: anyhow::Error = BoardError::CardNotFound { id: 7 }.into();
        let err = err.context("Failed to update card");
        match err.downcast_ref::<BoardError>() {
            Some(BoardError::CardNotFound { id }) => assert_eq!(*id, 7),
            other => panic!("Expected CardNotFound, got {:?}", other),
        }
    }

    #[test]
    fn client_error_converts_from_ordering_error() {
        let err: ClientError = OrderingError::UnknownCard(9).into();
        match &err {
            ClientError::InvalidDrop(OrderingError::UnknownCard(id)) => assert_eq!(*id, 9),
            _ => panic!("Expected InvalidDrop(UnknownCard)"),
        }
        assert!(err.to_string().contains("Card 9"));
    }

    #[test]
    fn client_error_status_display() {
        let err = ClientError::Status {
            status: 400,
            message: "Orders must be an array".into(),
        };
        assert_eq!(
            err.to_string(),
            "Server returned 400: Orders must be an array"
        );
    }

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BoardError>();
        assert_send_sync::<OrderingError>();
        assert_send_sync::<ClientError>();
    }
}
