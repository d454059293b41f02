// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Free-form activity records.

use super::record::{Field, FieldKind, Record, Schema, SqliteQuery};
use crate::forms::{self, FormErrors};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stored activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    pub description: String,
    /// Minutes
    pub duration: i64,
}

/// Activity form as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ActivityForm {
    #[serde(default, deserialize_with = "forms::trimmed")]
    #[validate(
        custom(function = "forms::validate_required"),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub description: String,
    #[serde(default, deserialize_with = "forms::trimmed")]
    #[validate(custom(function = "forms::validate_integer"))]
    pub duration: String,
}

/// Validated activity values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub description: String,
    pub duration: i64,
}

impl Record for Activity {
    type Form = ActivityForm;
    type Input = NewActivity;

    const SCHEMA: Schema = Schema {
        table: "activities",
        path: "/activity",
        title: "Activities",
        noun: "Activity",
        fields: &[
            Field {
                name: "description",
                label: "Description",
                kind: FieldKind::Text,
            },
            Field {
                name: "duration",
                label: "Duration (minutes)",
                kind: FieldKind::Integer,
            },
        ],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn to_form(&self) -> ActivityForm {
        ActivityForm {
            description: self.description.clone(),
            duration: self.duration.to_string(),
        }
    }

    fn validate(form: &ActivityForm) -> Result<NewActivity, FormErrors> {
        forms::check(form)?;
        Ok(NewActivity {
            description: form.description.clone(),
            duration: forms::parse_integer("duration", &form.duration)?,
        })
    }

    fn bind<'q>(input: &'q NewActivity, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(input.description.as_str()).bind(input.duration)
    }
}
