//! JSON API handlers.
//!
//! Each handler corresponds to an API endpoint and returns an [`ApiReply`].
//! Failures bubble up as `anyhow::Error` and are mapped to a status by the
//! router.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::stats::EventStatus;
use crate::store::{Entry, HabitPatch, HabitView, NewEntry, NewHabit, StoreError};
use crate::validation;

use super::{ApiReply, Query, WebContext};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HabitsResponse {
    habits: Vec<HabitView>,
}

#[derive(Serialize)]
struct CompletionsResponse<'a> {
    habit_id: u64,
    completions: Vec<&'a Entry>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store_path: String,
    store_exists: bool,
    habits: usize,
    archived: usize,
    activity_log: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serialize `data` as the body of a reply with `status`.
fn json_reply<T: Serialize>(status: u16, data: &T) -> Result<ApiReply> {
    let body = serde_json::to_value(data).context("failed to serialize JSON response")?;
    Ok(ApiReply {
        status,
        body: Some(body),
    })
}

fn parse_body<'a, T: serde::Deserialize<'a>>(body: &'a str) -> Result<T> {
    serde_json::from_str(body).context("invalid JSON in request body")
}

// ---------------------------------------------------------------------------
// Habits
// ---------------------------------------------------------------------------

/// `GET /api/habits[?include_archived=true]` — every habit with statistics.
pub fn list_habits(ctx: &WebContext, query: &Query) -> Result<ApiReply> {
    let store = ctx.open_store()?;
    let resp = HabitsResponse {
        habits: store.views(query.include_archived, query.today()),
    };
    json_reply(200, &resp)
}

/// `POST /api/habits` — create a habit.
pub fn create_habit(ctx: &WebContext, query: &Query, body: &str) -> Result<ApiReply> {
    let new: NewHabit = parse_body(body)?;
    let mut store = ctx.open_store()?;
    let habit = store.create_habit(new)?;
    json_reply(201, &HabitView::build(&habit, query.today()))
}

/// `GET /api/habits/{id}` — one habit with statistics.
pub fn get_habit(ctx: &WebContext, query: &Query, id: u64) -> Result<ApiReply> {
    let store = ctx.open_store()?;
    json_reply(200, &store.view(id, query.today())?)
}

/// `PUT /api/habits/{id}` — update the fields present in the body.
pub fn update_habit(ctx: &WebContext, query: &Query, id: u64, body: &str) -> Result<ApiReply> {
    let patch: HabitPatch = parse_body(body)?;
    let mut store = ctx.open_store()?;
    let habit = store.update_habit(id, patch)?;
    json_reply(200, &HabitView::build(&habit, query.today()))
}

/// `DELETE /api/habits/{id}` — remove a habit and its history.
pub fn delete_habit(ctx: &WebContext, id: u64) -> Result<ApiReply> {
    let mut store = ctx.open_store()?;
    store.delete_habit(id)?;
    Ok(ApiReply::no_content())
}

/// `PATCH /api/habits/{id}/archive` — hide a habit from default listings.
pub fn archive_habit(ctx: &WebContext, query: &Query, id: u64) -> Result<ApiReply> {
    let mut store = ctx.open_store()?;
    let habit = store.archive_habit(id)?;
    json_reply(200, &HabitView::build(&habit, query.today()))
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// `GET /api/habits/{id}/completions` — entries, newest first.
pub fn list_completions(ctx: &WebContext, id: u64) -> Result<ApiReply> {
    let store = ctx.open_store()?;
    let resp = CompletionsResponse {
        habit_id: id,
        completions: store.entries(id)?,
    };
    json_reply(200, &resp)
}

/// `POST /api/habits/{id}/complete` — mark a day completed.
pub fn complete(ctx: &WebContext, id: u64, body: &str) -> Result<ApiReply> {
    mark(ctx, id, body, EventStatus::Completed)
}

/// `POST /api/habits/{id}/skip` — mark a day skipped.
pub fn skip(ctx: &WebContext, id: u64, body: &str) -> Result<ApiReply> {
    mark(ctx, id, body, EventStatus::Skipped)
}

fn mark(ctx: &WebContext, id: u64, body: &str, status: EventStatus) -> Result<ApiReply> {
    let new: NewEntry = parse_body(body)?;
    let mut store = ctx.open_store()?;
    let entry = store.mark(id, new, status)?;
    json_reply(201, &entry)
}

/// `DELETE /api/habits/{id}/completions/{date}` — remove one day's entry.
pub fn remove_completion(ctx: &WebContext, id: u64, date: &str) -> Result<ApiReply> {
    let date: NaiveDate = validation::date(date).map_err(StoreError::from)?;
    let mut store = ctx.open_store()?;
    store.remove_entry(id, date)?;
    Ok(ApiReply::no_content())
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// `GET /api/health` — store summary.
pub fn get_health(ctx: &WebContext) -> Result<ApiReply> {
    let store = ctx.open_store()?;
    let all = store.list_habits(true);
    let archived = all.iter().filter(|h| h.is_archived()).count();

    let resp = HealthResponse {
        status: "ok",
        store_path: ctx.store_path.display().to_string(),
        store_exists: ctx.store_path.exists(),
        habits: all.len() - archived,
        archived,
        activity_log: ctx
            .activity
            .as_ref()
            .map(|log| log.path().display().to_string()),
    };

    json_reply(200, &resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
