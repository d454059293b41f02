// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Meal records.

use super::record::{Field, FieldKind, Record, Schema, SqliteQuery};
use crate::forms::{self, FormErrors};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stored meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub calories: i64,
}

/// Meal form as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MealForm {
    #[serde(default, deserialize_with = "forms::trimmed")]
    #[validate(
        custom(function = "forms::validate_required"),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub name: String,
    #[serde(default, deserialize_with = "forms::trimmed")]
    #[validate(custom(function = "forms::validate_integer"))]
    pub calories: String,
}

/// Validated meal values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeal {
    pub name: String,
    pub calories: i64,
}

impl Record for Meal {
    type Form = MealForm;
    type Input = NewMeal;

    const SCHEMA: Schema = Schema {
        table: "meals",
        path: "/meals",
        title: "Meals",
        noun: "Meal",
        fields: &[
            Field {
                name: "name",
                label: "Meal Name",
                kind: FieldKind::Text,
            },
            Field {
                name: "calories",
                label: "Calories",
                kind: FieldKind::Integer,
            },
        ],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn to_form(&self) -> MealForm {
        MealForm {
            name: self.name.clone(),
            calories: self.calories.to_string(),
        }
    }

    fn validate(form: &MealForm) -> Result<NewMeal, FormErrors> {
        forms::check(form)?;
        Ok(NewMeal {
            name: form.name.clone(),
            calories: forms::parse_integer("calories", &form.calories)?,
        })
    }

    fn bind<'q>(input: &'q NewMeal, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(input.name.as_str()).bind(input.calories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{REQUIRED, TOO_LONG};

    #[test]
    fn test_meal_name_too_long() {
        let form = MealForm {
            name: "a".repeat(101),
            calories: "500".to_string(),
        };

        let errors = Meal::validate(&form).unwrap_err();
        assert_eq!(errors.for_field("name"), [TOO_LONG.to_string()]);
        assert!(errors.for_field("calories").is_empty());
    }

    #[test]
    fn test_meal_calories_required() {
        let form = MealForm {
            name: "Oatmeal".to_string(),
            calories: String::new(),
        };

        let errors = Meal::validate(&form).unwrap_err();
        assert_eq!(errors.for_field("calories"), [REQUIRED.to_string()]);
    }

    #[test]
    fn test_meal_accepts_negative_calories() {
        let form = MealForm {
            name: "Correction".to_string(),
            calories: "-120".to_string(),
        };

        assert_eq!(Meal::validate(&form).unwrap().calories, -120);
    }
}
