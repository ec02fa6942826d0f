//! Unified error codes for the table visit service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Staff authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Visit session errors
//! - 4xxx: Order errors
//! - 5xxx: Invoice errors
//! - 6xxx: Product errors
//! - 7xxx: Table errors
//! - 8xxx: Staff user errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can switch on
/// a stable number regardless of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Staff auth ====================
    /// Staff user is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Visit session ====================
    /// Device session missing, inactive, or bound to an ended visit
    SessionInvalid = 3001,
    /// Device session belongs to another table
    SessionTableMismatch = 3002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no lines
    OrderEmpty = 4007,
    /// Order is not in a state that allows the operation
    OrderInvalidState = 4008,
    /// Requested order state is not a valid transition target
    OrderInvalidTarget = 4009,
    /// Line quantity must be positive
    InvalidQuantity = 4010,
    /// Order already has an invoice
    OrderAlreadyInvoiced = 4011,

    // ==================== 5xxx: Invoice ====================
    /// Invoice not found
    InvoiceNotFound = 5001,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product has invalid price
    ProductInvalidPrice = 6002,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is occupied (open visit)
    TableOccupied = 7002,
    /// Table is closed and does not accept orders
    TableClosed = 7005,
    /// Table number already in use
    TableNumberExists = 7006,
    /// Table number must be positive
    InvalidTableNumber = 7007,
    /// Table is referenced by orders
    TableHasOrders = 7104,
    /// Table still has pending orders
    TableHasPendingOrders = 7105,

    // ==================== 8xxx: Staff ====================
    /// Staff user not found
    StaffUserNotFound = 8001,
    /// Group not found
    GroupNotFound = 8101,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Session
            ErrorCode::SessionInvalid => "Session is not valid, scan the table code again",
            ErrorCode::SessionTableMismatch => "Session does not belong to this table",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order must contain at least one line",
            ErrorCode::OrderInvalidState => "Order is no longer pending",
            ErrorCode::OrderInvalidTarget => "Order can only be confirmed or rejected",
            ErrorCode::InvalidQuantity => "Quantity must be at least 1",
            ErrorCode::OrderAlreadyInvoiced => "Order has already been invoiced",

            // Invoice
            ErrorCode::InvoiceNotFound => "Invoice not found",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product has invalid price",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableOccupied => "Table is occupied",
            ErrorCode::TableClosed => "Table is closed",
            ErrorCode::TableNumberExists => "Table number already exists",
            ErrorCode::InvalidTableNumber => "Table number must be positive",
            ErrorCode::TableHasOrders => "Table has associated orders",
            ErrorCode::TableHasPendingOrders => "Resolve pending orders before closing the table",

            // Staff
            ErrorCode::StaffUserNotFound => "Staff user not found",
            ErrorCode::GroupNotFound => "Group not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Session
            3001 => Ok(ErrorCode::SessionInvalid),
            3002 => Ok(ErrorCode::SessionTableMismatch),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::OrderInvalidState),
            4009 => Ok(ErrorCode::OrderInvalidTarget),
            4010 => Ok(ErrorCode::InvalidQuantity),
            4011 => Ok(ErrorCode::OrderAlreadyInvoiced),

            // Invoice
            5001 => Ok(ErrorCode::InvoiceNotFound),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableOccupied),
            7005 => Ok(ErrorCode::TableClosed),
            7006 => Ok(ErrorCode::TableNumberExists),
            7007 => Ok(ErrorCode::InvalidTableNumber),
            7104 => Ok(ErrorCode::TableHasOrders),
            7105 => Ok(ErrorCode::TableHasPendingOrders),

            // Staff
            8001 => Ok(ErrorCode::StaffUserNotFound),
            8101 => Ok(ErrorCode::GroupNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
