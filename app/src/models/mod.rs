// noskem/src/models/mod.rs

//! Records of the hosted schema, decoded from the JSON rows `RemoteDb` returns.
//!
//! The status enums mirror the values the stored procedures write. Nothing
//! in the application moves a record from one status to another on its own.

pub mod category;
pub mod dispute;
pub mod engagement;
pub mod inspection;
pub mod item;
pub mod notification;
pub mod offer;
pub mod order;
pub mod profile;
pub mod provider;
pub mod review;
pub mod transaction;

pub use category::Category;
pub use dispute::DisputeMessage;
pub use engagement::{Like, SavedSearch};
pub use inspection::InspectionReport;
pub use item::{Item, ItemCondition, ItemStatus};
pub use notification::{Notification, NotificationKind};
pub use offer::{Offer, OfferStatus};
pub use order::{Order, OrderStatus};
pub use profile::{Profile, Role};
pub use provider::ServiceProvider;
pub use review::Review;
pub use transaction::FinancialTransaction;
