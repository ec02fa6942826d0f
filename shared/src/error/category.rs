//! Error category and kind classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Staff authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Visit session errors
/// - 4xxx: Order errors
/// - 5xxx: Invoice errors
/// - 6xxx: Product errors
/// - 7xxx: Table errors
/// - 8xxx: Staff user errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Visit session errors (3xxx)
    Session,
    /// Order errors (4xxx)
    Order,
    /// Invoice errors (5xxx)
    Invoice,
    /// Product errors (6xxx)
    Product,
    /// Table errors (7xxx)
    Table,
    /// Staff user errors (8xxx)
    Staff,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Session,
            4000..5000 => Self::Order,
            5000..6000 => Self::Invoice,
            6000..7000 => Self::Product,
            7000..8000 => Self::Table,
            8000..9000 => Self::Staff,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Session => "session",
            Self::Order => "order",
            Self::Invoice => "invoice",
            Self::Product => "product",
            Self::Table => "table",
            Self::Staff => "staff",
            Self::System => "system",
        }
    }
}

/// Caller-facing failure kind
///
/// Every [`ErrorCode`] falls into exactly one kind; callers that only care
/// about how to react (re-scan, fix input, refresh) match on this instead of
/// individual codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing input
    InvalidArgument,
    /// Referenced entity does not exist
    NotFound,
    /// Operation collides with current state of another entity
    Conflict,
    /// Session or staff credentials do not allow the operation
    Unauthorized,
    /// Entity is in a state that forbids the operation
    InvalidState,
    /// Infrastructure failure
    Internal,
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }

    /// Get the failure kind for this error code
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound
            | Self::OrderNotFound
            | Self::InvoiceNotFound
            | Self::ProductNotFound
            | Self::TableNotFound
            | Self::StaffUserNotFound
            | Self::GroupNotFound => ErrorKind::NotFound,

            Self::AlreadyExists
            | Self::TableOccupied
            | Self::TableClosed
            | Self::TableNumberExists
            | Self::TableHasOrders
            | Self::TableHasPendingOrders
            | Self::OrderAlreadyInvoiced => ErrorKind::Conflict,

            Self::NotAuthenticated
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled
            | Self::PermissionDenied
            | Self::SessionInvalid
            | Self::SessionTableMismatch => ErrorKind::Unauthorized,

            Self::OrderInvalidState => ErrorKind::InvalidState,

            Self::InternalError | Self::DatabaseError | Self::ConfigError => ErrorKind::Internal,

            Self::Success
            | Self::ValidationFailed
            | Self::ValueOutOfRange
            | Self::OrderEmpty
            | Self::OrderInvalidTarget
            | Self::InvalidQuantity
            | Self::ProductInvalidPrice
            | Self::InvalidTableNumber => ErrorKind::InvalidArgument,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Session);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Order);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Invoice);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::Product);
        assert_eq!(ErrorCategory::from_code(7001), ErrorCategory::Table);
        assert_eq!(ErrorCategory::from_code(8001), ErrorCategory::Staff);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::SessionInvalid.category(), ErrorCategory::Session);
        assert_eq!(ErrorCode::TableClosed.category(), ErrorCategory::Table);
        assert_eq!(ErrorCode::InvoiceNotFound.category(), ErrorCategory::Invoice);
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ErrorCode::OrderEmpty.kind(), ErrorKind::InvalidArgument);
        assert_eq!(ErrorCode::InvalidTableNumber.kind(), ErrorKind::InvalidArgument);
        assert_eq!(ErrorCode::TableNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(ErrorCode::ProductNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(ErrorCode::TableNumberExists.kind(), ErrorKind::Conflict);
        assert_eq!(ErrorCode::TableHasPendingOrders.kind(), ErrorKind::Conflict);
        assert_eq!(ErrorCode::TableClosed.kind(), ErrorKind::Conflict);
        assert_eq!(ErrorCode::SessionInvalid.kind(), ErrorKind::Unauthorized);
        assert_eq!(ErrorCode::SessionTableMismatch.kind(), ErrorKind::Unauthorized);
        assert_eq!(ErrorCode::PermissionDenied.kind(), ErrorKind::Unauthorized);
        assert_eq!(ErrorCode::OrderInvalidState.kind(), ErrorKind::InvalidState);
        assert_eq!(ErrorCode::DatabaseError.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&ErrorCategory::Session).unwrap();
        assert_eq!(json, "\"session\"");
        let kind: ErrorKind = serde_json::from_str("\"invalid_state\"").unwrap();
        assert_eq!(kind, ErrorKind::InvalidState);
    }
}
