//! Business logic services for the inventory platform

pub mod alert;
pub mod auth;
pub mod location;
pub mod movement;
pub mod notification;
pub mod party;
pub mod product;
pub mod templates;
pub mod totp;
pub mod user;

pub use alert::AlertService;
pub use auth::AuthService;
pub use location::LocationRecorder;
pub use movement::{MovementOutcome, MovementService};
pub use notification::{spawn_low_stock_worker, LowStockNotifier, LowStockWorker};
pub use party::{ClientService, SupplierService};
pub use product::ProductService;
pub use user::UserService;
