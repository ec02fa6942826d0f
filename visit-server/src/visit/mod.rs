//! 桌台访问与点单生命周期引擎
//!
//! Components, leaf first:
//!
//! - [`TableRegistry`] - open/closed flag and the secrets of the current visit
//! - [`VisitSessionManager`] - anonymous device sessions bound to a visit
//! - [`OrderLedger`] - order placement and the `Pending -> Confirmed|Rejected` machine
//! - [`InvoiceIssuer`] - tickets, and the close transaction that ends a visit
//!
//! All of them share one [`TableLocks`] map: mutations of the same table are
//! serialized, different tables never wait on each other.

pub mod invoice;
pub mod ledger;
pub mod locks;
pub mod registry;
pub mod secrets;
pub mod sessions;

pub use invoice::{GenerateOptions, InvoiceIssuer};
pub use ledger::{AnonymousOrder, NewOrder, OrderLedger};
pub use locks::TableLocks;
pub use registry::{TableRegistry, VisitOpening};
pub use sessions::{IssuedSession, ValidatedVisit, VisitSessionManager};
