//! Catalog listing endpoint.

use axum::{extract::State, Json};

use crate::server::AppContext;

/// `GET /media` — all known keys from the current catalog snapshot.
///
/// Served from the background-refreshed snapshot, never from a live
/// listing, so the endpoint stays fast and available even when the backend
/// is briefly unreachable.
pub async fn list_media(State(ctx): State<AppContext>) -> Json<Vec<String>> {
    Json(ctx.catalog.snapshot().keys.clone())
}
