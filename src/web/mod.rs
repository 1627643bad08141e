//! Local JSON API for streaks.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) exposing habit
//! management, day logging, and statistics as JSON endpoints:
//!
//! - `GET|POST /api/habits`, `GET|PUT|DELETE /api/habits/{id}`
//! - `PATCH /api/habits/{id}/archive`
//! - `GET /api/habits/{id}/completions`, `POST /api/habits/{id}/complete|skip`
//! - `DELETE /api/habits/{id}/completions/{date}`
//! - `GET /api/health`
//!
//! Launched via `streaks web` (default: `http://127.0.0.1:9746`). Every
//! stats-bearing route accepts `?today=YYYY-MM-DD` to pin the reference date.

mod api;

use std::io::Cursor;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::activity::ActivityLog;
use crate::config::StreaksConfig;
use crate::store::{Store, StoreError};
use crate::validation;

// ---------------------------------------------------------------------------
// Request context
// ---------------------------------------------------------------------------

/// What every handler needs: where the store lives and how to open it.
///
/// The store is reopened per request so edits made by the CLI while the
/// server is running are picked up.
#[derive(Debug, Clone)]
pub struct WebContext {
    store_path: PathBuf,
    default_color: String,
    activity: Option<ActivityLog>,
}

impl WebContext {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            default_color: crate::store::DEFAULT_COLOR.to_string(),
            activity: None,
        }
    }

    pub fn from_config(config: &StreaksConfig) -> Result<Self> {
        let store_path = config
            .general
            .store_path()
            .context("could not determine home directory for the habit store")?;
        Ok(Self {
            store_path,
            default_color: config.general.default_color.clone(),
            activity: ActivityLog::from_config(&config.logging),
        })
    }

    fn open_store(&self) -> Result<Store, StoreError> {
        Ok(Store::open(&self.store_path)?
            .with_default_color(&self.default_color)
            .with_activity_log(self.activity.clone()))
    }
}

/// A handler's result before it becomes an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: Option<serde_json::Value>,
}

impl ApiReply {
    pub fn ok(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    pub fn created(body: serde_json::Value) -> Self {
        Self {
            status: 201,
            body: Some(body),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    pub fn error(status: u16, message: impl std::fmt::Display) -> Self {
        Self {
            status,
            body: Some(serde_json::json!({ "error": message.to_string() })),
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let data = self
            .body
            .map(|b| b.to_string().into_bytes())
            .unwrap_or_default();
        let mut response = Response::from_data(data).with_status_code(StatusCode(self.status));
        if self.status != 204 {
            response = response.with_header(content_type_json());
        }
        response
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the API server on the given address.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user tracker). Errors are reported per request without
/// stopping the server.
pub fn serve(addr: &str, ctx: &WebContext) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("streaks API running at http://{addr}/api/habits");
    println!("Press Ctrl+C to stop.\n");

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = dispatch(ctx, &method, &url, body.as_deref());
        let status = reply.status;
        let _ = request.respond(reply.into_response());

        // Brief access log
        println!(
            "{} {} {} {}",
            Local::now().format("%H:%M:%S"),
            method,
            url,
            status
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Route a request to its handler and turn failures into error replies.
pub fn dispatch(ctx: &WebContext, method: &Method, url: &str, body: Option<&str>) -> ApiReply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let query = match Query::parse(query) {
        Ok(q) => q,
        Err(e) => return ApiReply::error(422, e),
    };
    let body = body.unwrap_or("{}");

    let result = match (method, segments.as_slice()) {
        (&Method::Get, ["api", "health"]) => api::get_health(ctx),

        (&Method::Get, ["api", "habits"]) => api::list_habits(ctx, &query),
        (&Method::Post, ["api", "habits"]) => api::create_habit(ctx, &query, body),

        (&Method::Get, ["api", "habits", id]) => with_id(id, |id| api::get_habit(ctx, &query, id)),
        (&Method::Put, ["api", "habits", id]) => {
            with_id(id, |id| api::update_habit(ctx, &query, id, body))
        }
        (&Method::Delete, ["api", "habits", id]) => with_id(id, |id| api::delete_habit(ctx, id)),
        (&Method::Patch, ["api", "habits", id, "archive"]) => {
            with_id(id, |id| api::archive_habit(ctx, &query, id))
        }

        (&Method::Get, ["api", "habits", id, "completions"]) => {
            with_id(id, |id| api::list_completions(ctx, id))
        }
        (&Method::Post, ["api", "habits", id, "complete"]) => {
            with_id(id, |id| api::complete(ctx, id, body))
        }
        (&Method::Post, ["api", "habits", id, "skip"]) => with_id(id, |id| api::skip(ctx, id, body)),
        (&Method::Delete, ["api", "habits", id, "completions", date]) => {
            with_id(id, |id| api::remove_completion(ctx, id, date))
        }

        _ => Ok(not_found()),
    };

    result.unwrap_or_else(|e| error_reply(&e))
}

/// Run `handler` with a numeric path id; non-numeric ids are not found.
fn with_id(raw: &str, handler: impl FnOnce(u64) -> Result<ApiReply>) -> Result<ApiReply> {
    match raw.parse::<u64>() {
        Ok(id) => handler(id),
        Err(_) => Ok(not_found()),
    }
}

/// Map an error to a status: missing records 404, bad input 422, else 500.
fn error_reply(err: &anyhow::Error) -> ApiReply {
    if let Some(store_err) = err.downcast_ref::<StoreError>() {
        let status = match store_err {
            StoreError::HabitNotFound(_) | StoreError::EntryNotFound { .. } => 404,
            StoreError::Validation(_) => 422,
            _ => 500,
        };
        return ApiReply::error(status, store_err);
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return ApiReply::error(422, format!("{err:#}"));
    }
    ApiReply::error(500, format!("{err:#}"))
}

fn not_found() -> ApiReply {
    ApiReply::error(404, "not found")
}

/// JSON content type header.
fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8")
        .expect("static header is valid")
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Recognized query parameters.
#[derive(Debug, Default)]
struct Query {
    today: Option<NaiveDate>,
    include_archived: bool,
}

impl Query {
    /// Parse a raw query string. Keys and values are percent-decoded.
    fn parse(raw: &str) -> Result<Self, validation::ValidationError> {
        let mut query = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "today" => query.today = Some(validation::date(&value)?),
                "include_archived" => {
                    query.include_archived = matches!(value.as_ref(), "true" | "1" | "yes")
                }
                _ => {}
            }
        }
        Ok(query)
    }

    /// The pinned reference date, or local today.
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parses_known_params() {
        let q = Query::parse("today=2024-03-10&include_archived=true&x=1").unwrap();
        assert_eq!(q.today, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert!(q.include_archived);

        let q = Query::parse("").unwrap();
        assert_eq!(q.today, None);
        assert!(!q.include_archived);
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let q = Query::parse("today=2024%2D03%2D10&include%5Farchived=1").unwrap();
        assert_eq!(q.today, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert!(q.include_archived);
    }

    #[test]
    fn encoded_today_param_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = WebContext::new(dir.path().join("habits.json"));
        let reply = dispatch(&ctx, &Method::Get, "/api/habits?today=2024%2D03%2D10", None);
        assert_eq!(reply.status, 200);
    }

    #[test]
    fn query_rejects_bad_today() {
        assert!(Query::parse("today=yesterday").is_err());
    }

    #[test]
    fn unknown_route_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = WebContext::new(dir.path().join("habits.json"));
        let reply = dispatch(&ctx, &Method::Get, "/api/nothing", None);
        assert_eq!(reply.status, 404);
    }

    #[test]
    fn non_numeric_id_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = WebContext::new(dir.path().join("habits.json"));
        let reply = dispatch(&ctx, &Method::Get, "/api/habits/abc", None);
        assert_eq!(reply.status, 404);
    }

    #[test]
    fn bad_today_param_is_422() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = WebContext::new(dir.path().join("habits.json"));
        let reply = dispatch(&ctx, &Method::Get, "/api/habits?today=03/10/2024", None);
        assert_eq!(reply.status, 422);
    }

    #[test]
    fn no_content_reply_has_no_body() {
        let reply = ApiReply::no_content();
        assert_eq!(reply.status, 204);
        assert!(reply.body.is_none());
    }
}
