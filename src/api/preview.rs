use salvo::prelude::*;
use serde_json::json;

use super::row_count_param;
use crate::core::preview::QueryKind;
use crate::utils::datasource::ObjectName;
use crate::utils::{get_app_state, AppError};

/// `GET /api/objects/{name}/{kind}?n=` — top, sample or summary as JSON.
#[handler]
pub async fn fetch_preview(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), AppError> {
    let state = get_app_state(depot)?;
    let name = req.param::<String>("name")
        .ok_or_else(|| AppError::BadRequest("Missing object name".to_string()))?;
    let kind: QueryKind = req.param::<String>("kind")
        .ok_or_else(|| AppError::BadRequest("Missing query kind".to_string()))?
        .parse()?;
    let object = ObjectName::parse(&name)?;
    let n = row_count_param(req, "n")?;

    let result = state.preview.fetch(kind, &object, n).await?;

    res.render(Json(json!({
        "object": object,
        "kind": kind,
        "columns": result.columns,
        "rows": result.rows,
        "row_count": result.row_count(),
        "execution_time_ms": result.execution_time_ms,
    })));
    Ok(())
}

/// `GET /api/cache`
#[handler]
pub async fn cache_stats(depot: &mut Depot, res: &mut Response) -> Result<(), AppError> {
    let state = get_app_state(depot)?;
    res.render(Json(state.preview.cache_stats().await));
    Ok(())
}

/// `DELETE /api/cache`
#[handler]
pub async fn clear_cache(depot: &mut Depot, res: &mut Response) -> Result<(), AppError> {
    let state = get_app_state(depot)?;
    let cleared = state.preview.clear_cache().await;
    res.render(Json(json!({ "cleared": cleared })));
    Ok(())
}

/// `POST /cache/clear` from the page form; sends the browser back where it came from.
#[handler]
pub async fn clear_cache_form(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), AppError> {
    let state = get_app_state(depot)?;
    state.preview.clear_cache().await;

    let target = req
        .header::<String>("referer")
        .as_deref()
        .and_then(local_path)
        .unwrap_or_else(|| "/".to_string());
    res.render(Redirect::other(target));
    Ok(())
}

/// Path and query of a same-site URL; refuses anything that is not a plain path.
fn local_path(referer: &str) -> Option<String> {
    let url = url::Url::parse(referer).ok()?;
    let mut target = url.path().to_string();
    if !target.starts_with('/') || target.starts_with("//") {
        return None;
    }
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    Some(target)
}
