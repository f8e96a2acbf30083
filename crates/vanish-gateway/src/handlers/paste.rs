use crate::error::{AppError, Result};
use crate::extract::NowOverride;
use crate::model::{new_paste_from_json, CreatePasteResponse};
use crate::page;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use axum::Json;
use tracing::{error, info};
use vanish_core::{PasteId, PasteView};

const DEFAULT_PROTO: &str = "http";
const DEFAULT_HOST: &str = "localhost:3000";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// The public URL of the HTML view of a paste.
fn paste_url(state: &AppState, headers: &HeaderMap, id: &PasteId) -> String {
    match state.public_base_url() {
        Some(base) => format!("{base}/p/{id}"),
        None => {
            let proto = header(headers, "x-forwarded-proto").unwrap_or(DEFAULT_PROTO);
            let host = header(headers, HOST.as_str()).unwrap_or(DEFAULT_HOST);
            format!("{proto}://{host}/p/{id}")
        }
    }
}

pub async fn create_paste_handler(
    State(state): State<AppState>,
    NowOverride(now): NowOverride,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatePasteResponse>)> {
    let params = new_paste_from_json(&body)?;
    let paste = state.store().create(params, now).await?;
    let url = paste_url(&state, &headers, &paste.id);

    info!(id = %paste.id, url = %url, "Paste created");
    Ok((
        StatusCode::CREATED,
        Json(CreatePasteResponse {
            id: paste.id.to_string(),
            url,
        }),
    ))
}

pub async fn get_paste_handler(
    State(state): State<AppState>,
    NowOverride(now): NowOverride,
    Path(id): Path<String>,
) -> Result<Json<PasteView>> {
    // ids we could never have issued are simply not found
    let id = PasteId::parse(&id).map_err(|_| AppError::NotFound)?;

    match state.store().read_and_consume(&id, now).await? {
        Some(paste) => Ok(Json(paste.view())),
        None => Err(AppError::NotFound),
    }
}

pub async fn view_paste_handler(
    State(state): State<AppState>,
    NowOverride(now): NowOverride,
    Path(id): Path<String>,
) -> (StatusCode, Html<String>) {
    let Ok(id) = PasteId::parse(&id) else {
        return (StatusCode::NOT_FOUND, Html(page::not_found_page()));
    };

    match state.store().read_and_consume(&id, now).await {
        Ok(Some(paste)) => (StatusCode::OK, Html(page::paste_page(&paste))),
        Ok(None) => (StatusCode::NOT_FOUND, Html(page::not_found_page())),
        Err(e) => {
            error!(id = %id, error = %e, "Failed to read paste for page");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page::error_page()))
        }
    }
}
