//! API endpoint modules.

pub mod health;
pub mod imports;
pub mod websocket;

pub use health::configure_health_routes;
pub use imports::configure_routes as configure_import_routes;
pub use websocket::configure_routes as configure_websocket_routes;
