//! Authentication module (C4): bearer secret, OAuth exchange, and the
//! session manager that ties both into one authentication decision.
//! Per-IP rate limiting of `/auth/*` is wired in `presenter-server`'s
//! middleware with `tower_governor`, since it's inherently an HTTP-layer
//! concern (no pure decision logic worth hoisting up here).

pub mod bearer;
pub mod oauth;
pub mod session;

pub use bearer::AuthSecrets;
pub use oauth::{OAuthModule, OAuthProfile};
pub use session::{AuthContext, SessionManager};
