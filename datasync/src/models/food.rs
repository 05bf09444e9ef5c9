//! Food-side tables: foods, their ingredients and tags

use super::{ColumnSpec, TableModel};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::Postgres;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Food {
    pub id: i32,
    pub name: String,
}

impl TableModel for Food {
    const TABLE: &'static str = "foods";
    const COLUMNS: &'static [ColumnSpec] = &[ColumnSpec::integer("id"), ColumnSpec::text("name")];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id).push_bind(self.name);
    }
}

/// Quantity of an ingredient in a food, optionally in a named unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FoodIngredient {
    pub ingredient_id: i32,
    pub food_id: i32,
    pub unit_id: Option<i32>,
    pub unit_quantity: Option<Decimal>,
}

impl TableModel for FoodIngredient {
    const TABLE: &'static str = "food_ingredients";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::integer("ingredient_id"),
        ColumnSpec::integer("food_id"),
        ColumnSpec::integer("unit_id").nullable(),
        ColumnSpec::numeric("unit_quantity").nullable(),
    ];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.ingredient_id)
            .push_bind(self.food_id)
            .push_bind(self.unit_id)
            .push_bind(self.unit_quantity);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PossibleFoodTag {
    pub id: i32,
    pub name: String,
    pub group: String,
}

impl TableModel for PossibleFoodTag {
    const TABLE: &'static str = "possible_food_tags";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::integer("id"),
        ColumnSpec::text("name"),
        ColumnSpec::text("group"),
    ];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.name)
            .push_bind(self.group);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FoodTag {
    pub food_id: i32,
    pub tag_id: i32,
}

impl TableModel for FoodTag {
    const TABLE: &'static str = "food_tags";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::integer("food_id"),
        ColumnSpec::integer("tag_id"),
    ];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.food_id).push_bind(self.tag_id);
    }
}
