// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout records.

use super::record::{Field, FieldKind, Record, Schema, SqliteQuery};
use crate::forms::{self, FormErrors};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stored workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Workout {
    pub id: i64,
    pub name: String,
    /// Minutes
    pub duration: i64,
}

/// Workout form as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct WorkoutForm {
    #[serde(default, deserialize_with = "forms::trimmed")]
    #[validate(
        custom(function = "forms::validate_required"),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub name: String,
    #[serde(default, deserialize_with = "forms::trimmed")]
    #[validate(custom(function = "forms::validate_integer"))]
    pub duration: String,
}

/// Validated workout values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkout {
    pub name: String,
    pub duration: i64,
}

impl Record for Workout {
    type Form = WorkoutForm;
    type Input = NewWorkout;

    const SCHEMA: Schema = Schema {
        table: "workouts",
        path: "/workouts",
        title: "Workouts",
        noun: "Workout",
        fields: &[
            Field {
                name: "name",
                label: "Workout Name",
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

    fn to_form(&self) -> WorkoutForm {
        WorkoutForm {
            name: self.name.clone(),
            duration: self.duration.to_string(),
        }
    }

    fn validate(form: &WorkoutForm) -> Result<NewWorkout, FormErrors> {
        forms::check(form)?;
        Ok(NewWorkout {
            name: form.name.clone(),
            duration: forms::parse_integer("duration", &form.duration)?,
        })
    }

    fn bind<'q>(input: &'q NewWorkout, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(input.name.as_str()).bind(input.duration)
    }
}
