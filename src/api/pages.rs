use salvo::prelude::*;
use serde_json::json;
use tracing::warn;

use super::render::{self, Controls};
use super::row_count_param;
use crate::utils::{get_app_state, AppError};

/// Landing page.
#[handler]
pub async fn home(depot: &mut Depot, res: &mut Response) -> Result<(), AppError> {
    let state = get_app_state(depot)?;
    let stats = state.preview.cache_stats().await;
    let body = render::home_body(&state.pages, &stats);
    res.render(Text::Html(render::layout("Welcome", &state.pages, None, &body)));
    Ok(())
}

/// One table or view page. Reads the widgets from the query string, runs the
/// selected preview and renders the result (or the error) in place.
#[handler]
pub async fn show_page(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), AppError> {
    let state = get_app_state(depot)?;
    let slug = req.param::<String>("slug")
        .ok_or_else(|| AppError::BadRequest("Missing slug".to_string()))?;

    let Some(page) = state.pages.get(&slug) else {
        let err = AppError::NotFound(format!("no page named {:?}", slug));
        res.status_code(err.status_code());
        res.render(Text::Html(render::layout(
            "Not found",
            &state.pages,
            None,
            &render::error_banner(&err),
        )));
        return Ok(());
    };

    let outcome = match read_controls(req) {
        Ok(controls) => {
            let result = match controls.mode {
                Some(kind) => Some(
                    state
                        .preview
                        .fetch(kind, &page.definition.object, controls.rows_for(kind))
                        .await,
                ),
                None => None,
            };
            (controls, result)
        }
        // Keep the page usable: show the bad input as an error, widgets reset.
        Err(err) => (Controls::default(), Some(Err(err))),
    };

    let (controls, result) = outcome;
    if let Some(Err(err)) = &result {
        if err.is_data_access() {
            warn!("Preview of {} failed: {}", page.definition.object, err);
        }
        res.status_code(err.status_code());
    }

    let stats = state.preview.cache_stats().await;
    let body = render::page_body(
        page,
        &controls,
        result.as_ref().map(|r| r.as_ref().map(|arc| &**arc)),
        &stats,
    );
    res.render(Text::Html(render::layout(
        &page.definition.title,
        &state.pages,
        Some(&page.slug),
        &body,
    )));
    Ok(())
}

/// Registered pages as JSON.
#[handler]
pub async fn list_pages(depot: &mut Depot, res: &mut Response) -> Result<(), AppError> {
    let state = get_app_state(depot)?;
    let pages: Vec<_> = state
        .pages
        .iter()
        .map(|page| {
            json!({
                "slug": page.slug,
                "title": page.definition.title,
                "object": page.definition.object,
            })
        })
        .collect();
    res.render(Json(json!({ "pages": pages, "total": pages.len() })));
    Ok(())
}

fn read_controls(req: &Request) -> Result<Controls, AppError> {
    let mode = match req.query::<String>("mode") {
        Some(raw) if !raw.trim().is_empty() => Some(raw.parse()?),
        _ => None,
    };

    Ok(Controls {
        top_n: row_count_param(req, "top_n")?,
        sample_n: row_count_param(req, "sample_n")?,
        mode,
    })
}
