pub mod admin_guard;
pub mod auth_guard;
pub mod rate_limit;
pub mod request_log;
pub mod security_headers;

pub use admin_guard::require_admin;
pub use auth_guard::{authenticate, optional_authenticate};
pub use request_log::request_log;
pub use security_headers::security_headers;
