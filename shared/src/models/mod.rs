//! Domain models for the inventory platform

mod location;
mod movement;
mod party;
mod product;
mod stock_alert;
mod user;

pub use location::*;
pub use movement::*;
pub use party::*;
pub use product::*;
pub use stock_alert::*;
pub use user::*;
