pub mod pages;
pub mod preview;
pub mod render;

use salvo::prelude::*;

use crate::utils::datasource::RowCount;
use crate::utils::middleware::inject_state;
use crate::utils::{AppError, AppState};

/// Full route tree: HTML pages at the root, JSON under `/api`.
pub fn router(state: AppState) -> Router {
    let api_router = Router::new()
        .push(Router::with_path("pages").get(pages::list_pages))
        .push(
            Router::with_path("cache")
                .get(preview::cache_stats)
                .delete(preview::clear_cache),
        )
        .push(Router::with_path("objects/{name}/{kind}").get(preview::fetch_preview));

    Router::new()
        .hoop(inject_state(state))
        .get(pages::home)
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("pages/{slug}").get(pages::show_page))
        .push(Router::with_path("cache/clear").post(preview::clear_cache_form))
        .push(Router::with_path("api").push(api_router))
}

#[handler]
async fn health_check(res: &mut Response) {
    res.render(Json(serde_json::json!({
        "status": "ok",
        "service": "db-peeker"
    })));
}

/// Row count from query parameter `key`. Absent or blank means the default;
/// anything else must be a whole number in range.
pub(crate) fn row_count_param(req: &Request, key: &str) -> Result<RowCount, AppError> {
    match req.query::<String>(key) {
        Some(raw) if !raw.trim().is_empty() => {
            let n = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| AppError::BadRequest(format!("{} must be a whole number", key)))?;
            RowCount::new(n)
        }
        _ => Ok(RowCount::default()),
    }
}
