//! Middleware and request extractors.

pub mod auth;
pub mod flash;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use flash::{Flash, FlashKind, FlashMessage};
pub use session::create_session_layer;
