use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{FixedOffset, Utc};
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::model::RankedItem;
use crate::selector::{select, SelectorParams};

pub struct AppState {
    pub config: Config,
    pub tz: FixedOffset,
    pub fetcher: Arc<Fetcher>,
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub items: Vec<RankedItem>,
    pub publishers: Vec<String>,
    pub window_hours: i64,
    pub tz_label: String,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

// Upper bound for the per-request window override
const MAX_WINDOW_HOURS: i64 = 24 * 365;

#[derive(Deserialize)]
pub struct IndexQuery {
    /// Per-request window override; out-of-range values fall back to config
    #[serde(default)]
    pub hours: Option<i64>,
}

// Route handlers
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IndexQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window_hours = match query.hours {
        Some(h) if h > 0 && h <= MAX_WINDOW_HOURS => h,
        _ => state.config.window_hours,
    };

    let pool = state.fetcher.fetch_all(&state.config.feeds).await;

    let params = SelectorParams {
        window_hours,
        min_per_feed: state.config.min_per_feed,
        global_limit: state.config.global_limit,
    };
    let now_local = Utc::now().with_timezone(&state.tz);
    let selection = select(&pool, &state.config.feed_names(), &params, now_local);

    info!(
        stories = selection.items.len(),
        sources = selection.publishers.len(),
        "page assembled"
    );

    Ok(HtmlTemplate(IndexTemplate {
        items: selection.items,
        publishers: selection.publishers,
        window_hours: selection.window_hours,
        tz_label: state.config.tz_label.clone(),
    }))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
