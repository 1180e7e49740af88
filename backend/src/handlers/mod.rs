//! HTTP handlers

pub mod alert;
pub mod auth;
pub mod health;
pub mod location;
pub mod movement;
pub mod party;
pub mod product;
pub mod user;

pub use alert::*;
pub use auth::*;
pub use health::*;
pub use location::*;
pub use movement::*;
pub use party::*;
pub use product::*;
pub use user::*;
