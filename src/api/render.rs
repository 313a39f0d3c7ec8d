//! Server-side HTML for the browser UI. Every interaction is a full page render.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use serde_json::Value;
use std::fmt::Write;

use crate::core::pages::{Page, PageRegistry};
use crate::core::preview::{CacheStats, QueryKind};
use crate::utils::datasource::{QueryResult, RowCount, MAX_ROWS, MIN_ROWS};
use crate::utils::AppError;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
nav { width: 260px; background: #f3f4f6; padding: 1rem; box-sizing: border-box; }
nav a { display: block; padding: .25rem .5rem; color: #1f2937; text-decoration: none; border-radius: 4px; }
nav a.active, nav a:hover { background: #e5e7eb; }
nav h3 { font-size: .8rem; text-transform: uppercase; color: #6b7280; margin: 1rem 0 .25rem; }
main { flex: 1; padding: 1.5rem 2rem; overflow-x: auto; }
.controls { display: flex; gap: 2rem; align-items: flex-end; flex-wrap: wrap; }
.controls label { display: block; font-size: .9rem; margin-bottom: .25rem; }
.buttons { margin: 1rem 0; display: flex; gap: .75rem; }
table { border-collapse: collapse; font-size: .85rem; }
th, td { border: 1px solid #e5e7eb; padding: .25rem .5rem; text-align: left; white-space: nowrap; }
th { background: #f9fafb; }
td.null { color: #9ca3af; font-style: italic; }
.error { background: #fee2e2; border: 1px solid #fca5a5; padding: .75rem 1rem; border-radius: 4px; }
.info { background: #e0f2fe; border: 1px solid #7dd3fc; padding: .75rem 1rem; border-radius: 4px; }
.meta { color: #6b7280; font-size: .8rem; }
"#;

/// Widget state of a table page, as read from the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub top_n: RowCount,
    pub sample_n: RowCount,
    pub mode: Option<QueryKind>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            top_n: RowCount::default(),
            sample_n: RowCount::default(),
            mode: None,
        }
    }
}

impl Controls {
    pub fn rows_for(&self, kind: QueryKind) -> RowCount {
        match kind {
            QueryKind::Sample => self.sample_n,
            _ => self.top_n,
        }
    }
}

pub fn layout(title: &str, pages: &PageRegistry, active: Option<&str>, body: &str) -> String {
    let mut nav = String::new();
    let _ = write!(
        nav,
        r#"<a href="/"{}>🏠 Home</a><h3>Tables and Views</h3>"#,
        if active.is_none() { r#" class="active""# } else { "" }
    );
    for page in pages.iter() {
        let class = if active == Some(page.slug.as_str()) { r#" class="active""# } else { "" };
        let _ = write!(
            nav,
            r#"<a href="/pages/{}" title="{}"{}>📄 {}</a>"#,
            attr(&page.slug),
            attr(&page.definition.object.to_string()),
            class,
            text(&page.definition.title)
        );
    }
    if pages.is_empty() {
        nav.push_str(r#"<p class="meta">No pages yet. Run <code>generate_pages</code>.</p>"#);
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{}</title><style>{}</style></head>
<body><nav>{}</nav><main>{}</main></body>
</html>"#,
        text(title),
        STYLE,
        nav,
        body
    )
}

pub fn home_body(pages: &PageRegistry, stats: &CacheStats) -> String {
    format!(
        r#"<h1>🗃️ Database Peeker</h1>
<p><strong>How to use this app</strong></p>
<ul>
<li>Pick any table from the sidebar to load previews or a data summary.</li>
<li>Adjust the row counts ({min}-{max}) and click <strong>Load</strong>.</li>
<li>Use <strong>Clear cache</strong> to fetch fresh data.</li>
</ul>
<hr>
<p class="info">Select a table from the sidebar to begin. {count} page(s) registered.</p>
{cache}"#,
        min = MIN_ROWS,
        max = MAX_ROWS,
        count = pages.len(),
        cache = cache_panel(stats)
    )
}

fn cache_panel(stats: &CacheStats) -> String {
    format!(
        r#"<form method="post" action="/cache/clear">
<p class="meta">Cache: {} entries, {} hits, {} misses, cleared {} time(s).</p>
<button type="submit">🧹 Clear cache</button>
</form>"#,
        stats.entries, stats.hits, stats.misses, stats.clears
    )
}

pub fn page_body(
    page: &Page,
    controls: &Controls,
    outcome: Option<Result<&QueryResult, &AppError>>,
    stats: &CacheStats,
) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        r#"<h1>{}</h1><p class="meta">{}</p>"#,
        text(&page.definition.title),
        text(&page.definition.object.to_string())
    );

    let _ = write!(
        body,
        r#"<form method="get" action="/pages/{slug}">
<div class="controls">
<div><label for="sample_n">Rows for <strong>Random sample</strong> ({min} – {max})</label>
<input type="number" id="sample_n" name="sample_n" min="{min}" max="{max}" step="1" value="{sample}"></div>
<div><label for="top_n">Rows for <strong>TOP-N</strong> view ({min} – {max})</label>
<input type="number" id="top_n" name="top_n" min="{min}" max="{max}" step="1" value="{top}"></div>
</div>
<div class="buttons">
<button type="submit" name="mode" value="top">👀 Load TOP-N rows</button>
<button type="submit" name="mode" value="sample">🎲 Load random sample</button>
<button type="submit" name="mode" value="summary">📊 Load summary</button>
</div>
</form>
<hr>"#,
        slug = attr(&page.slug),
        min = MIN_ROWS,
        max = MAX_ROWS,
        sample = controls.sample_n,
        top = controls.top_n,
    );

    match (controls.mode, outcome) {
        (_, Some(Err(err))) => body.push_str(&error_banner(err)),
        (Some(kind), Some(Ok(result))) => {
            let heading = match kind {
                QueryKind::Top => format!("📋 TOP {} rows", controls.top_n),
                QueryKind::Sample => format!("🎲 Random sample of {} rows", controls.sample_n),
                QueryKind::Summary => "📊 Summary statistics".to_string(),
            };
            let _ = write!(
                body,
                r#"<h2>{}</h2><p class="meta">{} row(s) · {} ms</p>{}"#,
                heading,
                result.row_count(),
                result.execution_time_ms,
                result_table(result)
            );
        }
        _ => body.push_str(r#"<p class="info">Choose the row counts and click a <strong>Load</strong> button.</p>"#),
    }

    body.push_str("<hr>");
    body.push_str(&cache_panel(stats));
    body
}

pub fn result_table(result: &QueryResult) -> String {
    let mut html = String::from("<table><thead><tr>");
    for column in &result.columns {
        let _ = write!(html, "<th>{}</th>", text(column));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &result.rows {
        html.push_str("<tr>");
        for cell in row {
            match cell {
                Value::Null => html.push_str(r#"<td class="null">NULL</td>"#),
                Value::String(s) => {
                    let _ = write!(html, "<td>{}</td>", text(s));
                }
                other => {
                    let _ = write!(html, "<td>{}</td>", text(&other.to_string()));
                }
            }
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

pub fn error_banner(err: &AppError) -> String {
    format!(r#"<div class="error">⚠️ {}</div>"#, text(&err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pages::PageDefinition;
    use crate::utils::datasource::ObjectName;
    use serde_json::json;

    fn page() -> Page {
        Page {
            slug: "v_customers".into(),
            definition: PageDefinition {
                title: "V_Customers".into(),
                object: ObjectName::new(Some("dmd"), "V_Customers").unwrap(),
            },
        }
    }

    #[test]
    fn test_table_escapes_and_marks_nulls() {
        let result = QueryResult::new(
            vec!["<b>".into(), "n".into()],
            vec![vec![json!("<script>"), Value::Null], vec![json!(3), json!(true)]],
        );
        let html = result_table(&result);
        assert!(html.contains("<th>&lt;b&gt;</th>"));
        assert!(html.contains("<td>&lt;script&gt;</td>"));
        assert!(html.contains(r#"<td class="null">NULL</td>"#));
        assert!(html.contains("<td>3</td><td>true</td>"));
    }

    #[test]
    fn test_page_body_shows_error_instead_of_table() {
        let err = AppError::DataAccess("Invalid object name 'x'".into());
        let controls = Controls {
            mode: Some(QueryKind::Top),
            ..Controls::default()
        };
        let html = page_body(&page(), &controls, Some(Err(&err)), &CacheStats::default());
        assert!(html.contains(r#"class="error""#));
        assert!(html.contains("Invalid object name &#x27;x&#x27;") || html.contains("Invalid object name 'x'"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_page_body_keeps_widget_values() {
        let controls = Controls {
            top_n: RowCount::new(12).unwrap(),
            sample_n: RowCount::new(3).unwrap(),
            mode: None,
        };
        let html = page_body(&page(), &controls, None, &CacheStats::default());
        assert!(html.contains(r#"name="top_n" min="1" max="20" step="1" value="12""#));
        assert!(html.contains(r#"name="sample_n" min="1" max="20" step="1" value="3""#));
        assert!(html.contains("click a <strong>Load</strong> button"));
    }
}
