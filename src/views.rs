// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered HTML pages.
//!
//! Templates are compiled into the binary and rendered with Tera. Every page
//! extends `base.html`, which shows the navigation, the signed-in user and
//! the flash messages drained from the session.

use crate::error::{AppError, Result};
use crate::forms::FormErrors;
use crate::middleware::session::CurrentSession;
use crate::models::{Record, Schema};
use axum::response::Html;
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("register.html", include_str!("../templates/register.html")),
    ("records.html", include_str!("../templates/records.html")),
    ("edit_record.html", include_str!("../templates/edit_record.html")),
];

/// Compiled template set.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> std::result::Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>> {
        Ok(Html(self.tera.render(name, context)?))
    }
}

/// One form input with its current value and errors.
#[derive(Debug, Serialize)]
pub struct FieldView<'a> {
    pub name: &'a str,
    pub label: &'a str,
    pub input_type: &'a str,
    pub input_mode: &'a str,
    pub value: String,
    pub errors: &'a [String],
}

/// One table row of a record listing.
#[derive(Debug, Serialize)]
pub struct RowView {
    pub id: i64,
    pub cells: Vec<serde_json::Value>,
    pub edit_path: String,
    pub delete_path: String,
}

/// Context shared by every page.
///
/// Drains the session's flash queue, so call it once per rendered page.
/// Creates no session; pages with a form use [`form_page_context`].
pub fn page_context(session: &CurrentSession) -> Context {
    let mut context = Context::new();
    context.insert("current_user", &session.user());
    context.insert("flashes", &session.take_flashes());
    context
}

/// [`page_context`] plus the session's CSRF token for the page's forms.
pub fn form_page_context(session: &CurrentSession) -> Result<Context> {
    let csrf_token = session.csrf_token()?;
    let mut context = page_context(session);
    context.insert("csrf_token", &csrf_token);
    Ok(context)
}

/// Inputs for a record form, filled from `form` and annotated with `errors`.
pub fn form_fields<'a, F: Serialize>(
    schema: &'a Schema,
    form: &F,
    errors: &'a FormErrors,
) -> Result<Vec<FieldView<'a>>> {
    let values = serde_json::to_value(form).map_err(|e| AppError::Internal(e.into()))?;

    Ok(schema
        .fields
        .iter()
        .map(|field| FieldView {
            name: field.name,
            label: field.label,
            input_type: "text",
            input_mode: field.kind.input_mode(),
            value: values
                .get(field.name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            errors: errors.for_field(field.name),
        })
        .collect())
}

/// Table rows for `records`, cells in schema field order.
pub fn record_rows<R: Record>(records: &[R]) -> Result<Vec<RowView>> {
    let schema = R::SCHEMA;

    records
        .iter()
        .map(|record| {
            let values = serde_json::to_value(record).map_err(|e| AppError::Internal(e.into()))?;
            Ok(RowView {
                id: record.id(),
                cells: schema
                    .fields
                    .iter()
                    .map(|field| values.get(field.name).cloned().unwrap_or_default())
                    .collect(),
                edit_path: schema.edit_path(record.id()),
                delete_path: schema.delete_path(record.id()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Workout, WorkoutForm};

    #[test]
    fn test_all_templates_compile() {
        assert!(Templates::new().is_ok());
    }

    #[test]
    fn test_form_fields_keep_submitted_values() {
        let form = WorkoutForm {
            name: "Run".to_string(),
            duration: "abc".to_string(),
        };
        let errors = FormErrors::single("duration", "Not a valid integer value.");

        let fields = form_fields(&Workout::SCHEMA, &form, &errors).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].value, "Run");
        assert!(fields[0].errors.is_empty());
        assert_eq!(fields[1].value, "abc");
        assert_eq!(fields[1].input_mode, "numeric");
        assert_eq!(fields[1].errors, ["Not a valid integer value.".to_string()]);
    }

    #[test]
    fn test_record_rows_follow_schema_order() {
        let workouts = vec![Workout {
            id: 3,
            name: "Run".to_string(),
            duration: 30,
        }];

        let rows = record_rows(&workouts).unwrap();

        assert_eq!(rows[0].id, 3);
        assert_eq!(rows[0].cells, [serde_json::json!("Run"), serde_json::json!(30)]);
        assert_eq!(rows[0].edit_path, "/workouts/edit/3");
        assert_eq!(rows[0].delete_path, "/workouts/delete/3");
    }
}
