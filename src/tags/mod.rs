mod access;
pub mod handlers;
pub mod store;

pub use access::TagAccess;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
