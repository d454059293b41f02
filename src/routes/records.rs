// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! List, create, edit and delete pages for any [`Record`] type.
//!
//! For a record type mounted at `/things`:
//! - `GET|POST /things` lists all records and adds one
//! - `GET|POST /things/edit/{id}` shows and saves the edit form
//! - `POST /things/delete/{id}` removes a record

use crate::error::{AppError, Result};
use crate::forms::{CsrfOnly, FormErrors, Submission, CSRF_FIELD};
use crate::middleware::session::CurrentSession;
use crate::models::Record;
use crate::routes::check_csrf;
use crate::services::FlashLevel;
use crate::views;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use std::sync::Arc;

/// Routes for record type `R` under its schema path.
pub fn routes<R: Record>() -> Router<Arc<AppState>> {
    let path = R::SCHEMA.path;
    Router::new()
        .route(path, get(list::<R>).post(create::<R>))
        .route(
            &format!("{path}/edit/{{id}}"),
            get(edit_form::<R>).post(update::<R>),
        )
        .route(&format!("{path}/delete/{{id}}"), post(delete::<R>))
}

fn not_found<R: Record>(raw_id: &str) -> AppError {
    AppError::NotFound(format!("{} {}", R::SCHEMA.noun, raw_id))
}

/// Ids that are not integers name no record.
fn parse_id<R: Record>(raw_id: &str) -> Result<i64> {
    raw_id.parse().map_err(|_| not_found::<R>(raw_id))
}

async fn load<R: Record>(state: &AppState, raw_id: &str) -> Result<R> {
    let id = parse_id::<R>(raw_id)?;
    state
        .db
        .get::<R>(id)
        .await?
        .ok_or_else(|| not_found::<R>(raw_id))
}

async fn render_list<R: Record>(
    state: &AppState,
    session: &CurrentSession,
    form: &R::Form,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let schema = R::SCHEMA;
    let records = state.db.list::<R>().await?;

    let mut context = views::form_page_context(session)?;
    context.insert("schema", &schema);
    context.insert("rows", &views::record_rows(&records)?);
    context.insert("fields", &views::form_fields(&schema, form, errors)?);
    context.insert("form_errors", errors.for_field(CSRF_FIELD));
    state.templates.render("records.html", &context)
}

fn render_edit<R: Record>(
    state: &AppState,
    session: &CurrentSession,
    id: i64,
    form: &R::Form,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let schema = R::SCHEMA;

    let mut context = views::form_page_context(session)?;
    context.insert("schema", &schema);
    context.insert("action", &schema.edit_path(id));
    context.insert("fields", &views::form_fields(&schema, form, errors)?);
    context.insert("form_errors", errors.for_field(CSRF_FIELD));
    state.templates.render("edit_record.html", &context)
}

async fn list<R: Record>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Html<String>> {
    render_list::<R>(&state, &session, &R::Form::default(), &FormErrors::default()).await
}

async fn create<R: Record>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Form(submission): Form<Submission<R::Form>>,
) -> Result<Response> {
    let schema = R::SCHEMA;
    let validated = check_csrf(&session, &submission.csrf_token)
        .and_then(|()| R::validate(&submission.fields));

    match validated {
        Ok(input) => {
            let id = state.db.insert::<R>(&input).await?;
            tracing::info!(table = schema.table, id, "Record created");

            session.push_flash(
                FlashLevel::Success,
                format!("{} added successfully!", schema.noun),
            )?;
            Ok(Redirect::to(schema.path).into_response())
        }
        Err(errors) => {
            tracing::debug!(
                table = schema.table,
                fields = ?errors.fields().collect::<Vec<_>>(),
                "Rejected new record"
            );
            Ok(render_list::<R>(&state, &session, &submission.fields, &errors)
                .await?
                .into_response())
        }
    }
}

async fn edit_form<R: Record>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Path(raw_id): Path<String>,
) -> Result<Html<String>> {
    let record = load::<R>(&state, &raw_id).await?;
    render_edit::<R>(
        &state,
        &session,
        record.id(),
        &record.to_form(),
        &FormErrors::default(),
    )
}

async fn update<R: Record>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Path(raw_id): Path<String>,
    Form(submission): Form<Submission<R::Form>>,
) -> Result<Response> {
    let schema = R::SCHEMA;
    let id = load::<R>(&state, &raw_id).await?.id();

    let validated = check_csrf(&session, &submission.csrf_token)
        .and_then(|()| R::validate(&submission.fields));

    match validated {
        Ok(input) => {
            // The row may have been deleted since it was loaded.
            if !state.db.update::<R>(id, &input).await? {
                return Err(not_found::<R>(&raw_id));
            }
            tracing::info!(table = schema.table, id, "Record updated");

            session.push_flash(
                FlashLevel::Success,
                format!("{} updated successfully!", schema.noun),
            )?;
            Ok(Redirect::to(schema.path).into_response())
        }
        Err(errors) => {
            tracing::debug!(
                table = schema.table,
                id,
                fields = ?errors.fields().collect::<Vec<_>>(),
                "Rejected record update"
            );
            Ok(
                render_edit::<R>(&state, &session, id, &submission.fields, &errors)?
                    .into_response(),
            )
        }
    }
}

async fn delete<R: Record>(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Path(raw_id): Path<String>,
    Form(body): Form<CsrfOnly>,
) -> Result<Redirect> {
    let schema = R::SCHEMA;
    let id = parse_id::<R>(&raw_id)?;

    session
        .verify_csrf(&body.csrf_token)
        .map_err(|message| AppError::BadRequest(message.to_string()))?;

    if !state.db.delete::<R>(id).await? {
        return Err(not_found::<R>(&raw_id));
    }
    tracing::info!(table = schema.table, id, "Record deleted");

    session.push_flash(
        FlashLevel::Success,
        format!("{} deleted successfully!", schema.noun),
    )?;
    Ok(Redirect::to(schema.path))
}
