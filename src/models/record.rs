// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! The shape shared by every tracked record type.
//!
//! Workouts, meals and activities are all one text column plus one integer
//! column behind the same list/edit/delete pages. [`Record`] describes such a
//! type once (table, URL path, fields, validation, SQL binding) so the store
//! and the route handlers can be written a single time.

use crate::forms::FormErrors;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use validator::Validate;

/// A query under construction against SQLite.
pub type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>;

/// How a field is entered and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Integer,
}

impl FieldKind {
    /// HTML `inputmode` hint. Inputs stay `type="text"` so a rejected value
    /// is shown back exactly as typed.
    pub fn input_mode(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "numeric",
        }
    }
}

/// One editable column.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Field {
    /// Column name, also the form field and serde key
    pub name: &'static str,
    /// Label shown next to the input and as the table header
    pub label: &'static str,
    pub kind: FieldKind,
}

/// Static description of a record type.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Schema {
    /// SQL table name
    pub table: &'static str,
    /// Collection URL, e.g. `/workouts`
    pub path: &'static str,
    /// Page heading, e.g. "Workouts"
    pub title: &'static str,
    /// Singular name used in messages, e.g. "Workout"
    pub noun: &'static str,
    /// Editable columns, in the order [`Record::bind`] binds them
    pub fields: &'static [Field],
}

impl Schema {
    /// Comma separated editable column names.
    pub fn column_list(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn edit_path(&self, id: i64) -> String {
        format!("{}/edit/{}", self.path, id)
    }

    pub fn delete_path(&self, id: i64) -> String {
        format!("{}/delete/{}", self.path, id)
    }
}

/// A stored record type with a generated integer id.
pub trait Record:
    for<'r> sqlx::FromRow<'r, SqliteRow> + Serialize + Send + Sync + Unpin + 'static
{
    /// Raw form values as submitted (strings, possibly invalid).
    type Form: Validate + DeserializeOwned + Serialize + Default + Send + Sync + 'static;
    /// Validated values ready to be written.
    type Input: Send + Sync + 'static;

    const SCHEMA: Schema;

    fn id(&self) -> i64;

    /// Form pre-populated with this record's values.
    fn to_form(&self) -> Self::Form;

    /// Check a submitted form, returning typed values or per-field errors.
    fn validate(form: &Self::Form) -> Result<Self::Input, FormErrors>;

    /// Bind `input` in [`Schema::fields`] order.
    fn bind<'q>(input: &'q Self::Input, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
}
