//! HTTP API handlers for facelink-ae

pub mod health;
pub mod notifications;

pub use health::health_routes;
pub use notifications::notification_routes;
