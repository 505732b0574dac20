//! Token-protected streaming endpoints.
//!
//! `POST /token/media/batch-tokens` issues one signed token per requested
//! key. `HEAD`/`GET /token/media/signed/{token}` verify the token, extract
//! the key it grants, and then behave exactly like the unauthenticated
//! range endpoints. Any verification failure is a 401.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::Response,
    Json,
};

use crate::server::routes_range::{head_response, range_response};
use crate::server::AppContext;

/// `POST /token/media/batch-tokens`: JSON array of keys in, `{key: token}`
/// map out. Issuance does not check key existence; a token for a missing
/// key simply yields 404 when redeemed.
pub async fn batch_tokens(
    State(ctx): State<AppContext>,
    Json(keys): Json<Vec<String>>,
) -> Json<HashMap<String, String>> {
    let tokens = keys
        .into_iter()
        .map(|key| {
            let token = ctx.tokens.issue(&key);
            (key, token)
        })
        .collect();
    Json(tokens)
}

/// `HEAD`/`GET /token/media/signed/{token}`: verify, then behave like the
/// unauthenticated range endpoints for the granted key.
pub async fn serve_signed(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let key = verify(&ctx, &token)?;
    if method == Method::HEAD {
        head_response(&ctx, &key).await
    } else {
        range_response(&ctx, &key, &headers).await
    }
}

fn verify(ctx: &AppContext, token: &str) -> Result<String, StatusCode> {
    ctx.tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected access token");
        StatusCode::UNAUTHORIZED
    })
}
