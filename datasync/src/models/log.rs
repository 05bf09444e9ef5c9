//! Consumption tracking: prepared food in storage and the daily log

use super::{ColumnSpec, TableModel};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::Postgres;

/// Batch of prepared food, consumed portion by portion.
/// Exactly one of `food_id` / `ingredient_id` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredFood {
    pub id: i32,
    pub user_id: String,
    pub label: Option<String>,
    pub food_id: Option<i32>,
    pub ingredient_id: Option<i32>,
    pub prepared_portions: f64,
    pub remaining_portions: f64,
    pub per_portion_calories: f64,
    pub per_portion_protein: f64,
    pub per_portion_carbohydrates: f64,
    pub per_portion_fat: f64,
    pub per_portion_fiber: f64,
    pub is_finished: bool,
    pub prepared_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TableModel for StoredFood {
    const TABLE: &'static str = "stored_food";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::integer("id"),
        ColumnSpec::text("user_id"),
        ColumnSpec::text("label").nullable(),
        ColumnSpec::integer("food_id").nullable(),
        ColumnSpec::integer("ingredient_id").nullable(),
        ColumnSpec::float("prepared_portions"),
        ColumnSpec::float("remaining_portions"),
        ColumnSpec::float("per_portion_calories"),
        ColumnSpec::float("per_portion_protein"),
        ColumnSpec::float("per_portion_carbohydrates"),
        ColumnSpec::float("per_portion_fat"),
        ColumnSpec::float("per_portion_fiber"),
        ColumnSpec::boolean("is_finished"),
        ColumnSpec::timestamp("prepared_at"),
        ColumnSpec::timestamp("updated_at"),
        ColumnSpec::timestamp("completed_at").nullable(),
    ];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.user_id)
            .push_bind(self.label)
            .push_bind(self.food_id)
            .push_bind(self.ingredient_id)
            .push_bind(self.prepared_portions)
            .push_bind(self.remaining_portions)
            .push_bind(self.per_portion_calories)
            .push_bind(self.per_portion_protein)
            .push_bind(self.per_portion_carbohydrates)
            .push_bind(self.per_portion_fat)
            .push_bind(self.per_portion_fiber)
            .push_bind(self.is_finished)
            .push_bind(self.prepared_at)
            .push_bind(self.updated_at)
            .push_bind(self.completed_at);
    }
}

/// Portions consumed on a given day, sourced from exactly one of stored
/// food, an ingredient or a food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyLogEntry {
    pub id: i32,
    pub user_id: String,
    pub log_date: NaiveDate,
    pub stored_food_id: Option<i32>,
    pub ingredient_id: Option<i32>,
    pub food_id: Option<i32>,
    pub portions_consumed: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub fiber: f64,
    pub created_at: DateTime<Utc>,
}

impl TableModel for DailyLogEntry {
    const TABLE: &'static str = "daily_log_entries";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::integer("id"),
        ColumnSpec::text("user_id"),
        ColumnSpec::date("log_date"),
        ColumnSpec::integer("stored_food_id").nullable(),
        ColumnSpec::integer("ingredient_id").nullable(),
        ColumnSpec::integer("food_id").nullable(),
        ColumnSpec::float("portions_consumed"),
        ColumnSpec::float("calories"),
        ColumnSpec::float("protein"),
        ColumnSpec::float("carbohydrates"),
        ColumnSpec::float("fat"),
        ColumnSpec::float("fiber"),
        ColumnSpec::timestamp("created_at"),
    ];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.user_id)
            .push_bind(self.log_date)
            .push_bind(self.stored_food_id)
            .push_bind(self.ingredient_id)
            .push_bind(self.food_id)
            .push_bind(self.portions_consumed)
            .push_bind(self.calories)
            .push_bind(self.protein)
            .push_bind(self.carbohydrates)
            .push_bind(self.fat)
            .push_bind(self.fiber)
            .push_bind(self.created_at);
    }
}
