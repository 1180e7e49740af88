//! External API integrations

pub mod geolocation;
pub mod mailer;

pub use geolocation::GeoLocationClient;
pub use mailer::{mailer_from_config, LogMailer, Mailer, OutgoingMail, ResendMailer};
