// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod meal;
pub mod record;
pub mod user;
pub mod workout;

pub use activity::{Activity, ActivityForm, NewActivity};
pub use meal::{Meal, MealForm, NewMeal};
pub use record::{Field, FieldKind, Record, Schema};
pub use user::{LoginForm, RegistrationForm, User, UserIdentity};
pub use workout::{NewWorkout, Workout, WorkoutForm};
