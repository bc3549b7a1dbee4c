//! HTTP routes.

pub mod assets;
pub mod health;
pub mod proxy;

pub use assets::static_handler;
pub use health::{HealthResponse, health_routes};
pub use proxy::{blizzard_proxy_handler, open_proxy_handler, target_from_query};
