//! Request handling for the `squirrels` resource.
//!
//! | Method | Id?  | Store call | Success                |
//! |--------|------|------------|------------------------|
//! | GET    | no   | `list`     | 200, JSON array        |
//! | GET    | yes  | `get`      | 200, JSON object       |
//! | POST   | no   | `create`   | 201, JSON object       |
//! | PUT    | yes  | `update`   | 200, JSON object       |
//! | DELETE | yes  | `delete`   | 204, empty             |
//!
//! Every other combination, and any id that matches no record, gets the
//! plain-text 404 responder.

use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use service::squirrels::{SquirrelInput, SquirrelPayload};
use tracing::debug;

use crate::errors::JsonApiError;
use crate::routes::SharedStore;

pub const SQUIRRELS: &str = "squirrels";

/// A request path split into its resource kind and optional id segment.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedPath<'a> {
    pub kind: &'a str,
    pub id: Option<&'a str>,
}

/// `/squirrels` → (`squirrels`, None); `/squirrels/5` → (`squirrels`, Some("5")).
/// Leading and trailing slashes are ignored. Paths with more than two
/// segments do not parse.
pub fn parse_path(path: &str) -> Option<ParsedPath<'_>> {
    let mut parts = path.trim_matches('/').split('/');
    let kind = parts.next().unwrap_or_default();
    let id = parts.next().filter(|s| !s.is_empty());
    if parts.next().is_some() {
        return None;
    }
    Some(ParsedPath { kind, id })
}

/// Ids are written in canonical decimal: digits only, no sign, no leading
/// zero. Anything else can never name a record.
fn parse_id(raw: &str) -> Option<u64> {
    let canonical = !raw.is_empty()
        && raw.bytes().all(|b| b.is_ascii_digit())
        && (raw == "0" || !raw.starts_with('0'));
    if !canonical {
        return None;
    }
    raw.parse().ok()
}

/// Router fallback: map (method, path) onto a store operation.
pub async fn dispatch(State(store): State<SharedStore>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let parsed = match parse_path(&path) {
        Some(p) if p.kind == SQUIRRELS => p,
        _ => return handle_404(),
    };
    debug!(%method, kind = parsed.kind, id = ?parsed.id, "dispatching request");

    match (&method, parsed.id) {
        (&Method::GET, None) => handle_index(&store).await,
        (&Method::GET, Some(id)) => handle_retrieve(&store, id).await,
        (&Method::POST, None) => handle_create(&store, request).await,
        (&Method::PUT, Some(id)) => handle_update(&store, id, request).await,
        (&Method::DELETE, Some(id)) => handle_delete(&store, id).await,
        _ => handle_404(),
    }
}

pub async fn handle_index(store: &SharedStore) -> Response {
    Json(store.list().await).into_response()
}

pub async fn handle_retrieve(store: &SharedStore, id: &str) -> Response {
    let Some(id) = parse_id(id) else { return handle_404() };
    match store.get(id).await {
        Some(rec) => Json(rec).into_response(),
        None => handle_404(),
    }
}

pub async fn handle_create(store: &SharedStore, request: Request) -> Response {
    let input = match read_payload(request).await {
        Ok(input) => input,
        Err(e) => return e.into_response(),
    };
    match store.create(input).await {
        Ok(rec) => (StatusCode::CREATED, Json(rec)).into_response(),
        Err(e) => JsonApiError::from(e).into_response(),
    }
}

pub async fn handle_update(store: &SharedStore, id: &str, request: Request) -> Response {
    let Some(id) = parse_id(id) else { return handle_404() };
    let input = match read_payload(request).await {
        Ok(input) => input,
        Err(e) => return e.into_response(),
    };
    match store.update(id, input).await {
        Ok(Some(rec)) => Json(rec).into_response(),
        Ok(None) => handle_404(),
        Err(e) => JsonApiError::from(e).into_response(),
    }
}

pub async fn handle_delete(store: &SharedStore, id: &str) -> Response {
    let Some(id) = parse_id(id) else { return handle_404() };
    match store.delete(id).await {
        Ok(Some(_)) => StatusCode::NO_CONTENT.into_response(),
        Ok(None) => handle_404(),
        Err(e) => JsonApiError::from(e).into_response(),
    }
}

/// Fixed plain-text 404.
pub fn handle_404() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

/// Decode `name` and `size` from a JSON body or, for any other content type,
/// an urlencoded form. Missing fields are a 400, never a store call.
async fn read_payload(request: Request) -> Result<SquirrelInput, JsonApiError> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);

    let payload = if is_json {
        let Json(p) = Json::<SquirrelPayload>::from_request(request, &())
            .await
            .map_err(|rej| JsonApiError::bad_request(rej.body_text()))?;
        p
    } else {
        let Form(p) = Form::<SquirrelPayload>::from_request(request, &())
            .await
            .map_err(|rej| JsonApiError::bad_request(rej.body_text()))?;
        p
    };
    Ok(payload.into_input()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collection_and_item_paths() {
        assert_eq!(parse_path("/squirrels"), Some(ParsedPath { kind: "squirrels", id: None }));
        assert_eq!(parse_path("/squirrels/"), Some(ParsedPath { kind: "squirrels", id: None }));
        assert_eq!(parse_path("/squirrels/5"), Some(ParsedPath { kind: "squirrels", id: Some("5") }));
        assert_eq!(parse_path("squirrels/5/"), Some(ParsedPath { kind: "squirrels", id: Some("5") }));
    }

    #[test]
    fn rejects_deep_paths() {
        assert_eq!(parse_path("/squirrels/5/nuts"), None);
        assert_eq!(parse_path("/squirrels//5"), None);
    }

    #[test]
    fn root_has_empty_kind() {
        assert_eq!(parse_path("/"), Some(ParsedPath { kind: "", id: None }));
    }

    #[test]
    fn ids_must_be_numeric() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("-1"), None);
    }

    #[test]
    fn ids_must_be_canonical() {
        assert_eq!(parse_id("0"), Some(0));
        assert_eq!(parse_id("+5"), None);
        assert_eq!(parse_id("05"), None);
        assert_eq!(parse_id("00"), None);
        assert_eq!(parse_id("18446744073709551616"), None);
    }
}
