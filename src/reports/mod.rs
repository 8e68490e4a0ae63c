pub mod csv_export;
pub mod dto;
pub mod handlers;
pub mod pdf;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::report_routes())
}
