//! Byte-range streaming endpoints.
//!
//! `HEAD /range/media/{key}` reports the full size and range support;
//! `GET /range/media/{key}` serves the resolved interval. Status is 206
//! exactly when the response is a sub-range of the resource, matching
//! `Content-Range` emission on every path (including the token-protected
//! one, which reuses these helpers).

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::Response,
};

use crate::range;
use crate::server::{storage_status, AppContext};
use crate::storage::content_type_for_key;

/// `HEAD`/`GET /range/media/{key}`.
///
/// HEAD reports the full size and range support with no body; GET serves
/// the resolved interval.
pub async fn serve_media(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    if method == Method::HEAD {
        head_response(&ctx, &key).await
    } else {
        range_response(&ctx, &key, &headers).await
    }
}

/// Build the HEAD response for a key. Size comes from the metadata cache.
pub(crate) async fn head_response(ctx: &AppContext, key: &str) -> Result<Response, StatusCode> {
    let size = ctx.metadata.get_size(key).await.map_err(storage_status)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::CONTENT_TYPE, content_type_for_key(key))
        .body(Body::empty())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Resolve the Range header against the cached size and serve the interval.
///
/// `Content-Length` reflects the resolved interval, not the bytes actually
/// read; a short read near end-of-object delivers fewer bytes under the
/// same headers.
pub(crate) async fn range_response(
    ctx: &AppContext,
    key: &str,
    headers: &HeaderMap,
) -> Result<Response, StatusCode> {
    let total = ctx.metadata.get_size(key).await.map_err(storage_status)?;

    let range_header = headers.get(header::RANGE).and_then(|h| h.to_str().ok());
    let resolved = range::resolve(range_header, total, ctx.config.streaming.chunk_size_bytes);
    let r = resolved.range;

    let body = ctx
        .storage
        .read_chunk(key, r.start, r.length())
        .await
        .map_err(storage_status)?;

    let status = if r.is_partial() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, content_type_for_key(key))
        .header(header::CONTENT_LENGTH, r.length().to_string());

    if r.is_partial() {
        builder = builder.header(header::CONTENT_RANGE, r.content_range());
    }

    builder
        .body(Body::from(body))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
