//! Ingredient-side tables: ingredients, units, nutrition facts and tags

use super::{ColumnSpec, TableModel};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::Postgres;

// ============================================================================
// Ingredients
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
}

impl TableModel for Ingredient {
    const TABLE: &'static str = "ingredients";
    const COLUMNS: &'static [ColumnSpec] = &[ColumnSpec::integer("id"), ColumnSpec::text("name")];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id).push_bind(self.name);
    }
}

/// Measurement unit for an ingredient, expressed in grams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IngredientUnit {
    pub id: i32,
    pub ingredient_id: i32,
    pub name: String,
    pub grams: Decimal,
}

impl TableModel for IngredientUnit {
    const TABLE: &'static str = "ingredient_units";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::integer("id"),
        ColumnSpec::integer("ingredient_id"),
        ColumnSpec::text("name"),
        ColumnSpec::numeric("grams"),
    ];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.ingredient_id)
            .push_bind(self.name)
            .push_bind(self.grams);
    }
}

/// Per-100g nutrition facts of one ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Nutrition {
    pub id: i32,
    pub ingredient_id: i32,
    pub calories: Decimal,
    pub fat: Decimal,
    pub carbohydrates: Decimal,
    pub protein: Decimal,
    pub fiber: Decimal,
}

impl TableModel for Nutrition {
    const TABLE: &'static str = "nutrition";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::integer("id"),
        ColumnSpec::integer("ingredient_id"),
        ColumnSpec::numeric("calories"),
        ColumnSpec::numeric("fat"),
        ColumnSpec::numeric("carbohydrates"),
        ColumnSpec::numeric("protein"),
        ColumnSpec::numeric("fiber"),
    ];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.ingredient_id)
            .push_bind(self.calories)
            .push_bind(self.fat)
            .push_bind(self.carbohydrates)
            .push_bind(self.protein)
            .push_bind(self.fiber);
    }
}

// ============================================================================
// Tags
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PossibleIngredientTag {
    pub id: i32,
    pub name: String,
    pub group: String,
}

impl TableModel for PossibleIngredientTag {
    const TABLE: &'static str = "possible_ingredient_tags";
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

/// Link between an ingredient and one of its tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IngredientTag {
    pub ingredient_id: i32,
    pub tag_id: i32,
}

impl TableModel for IngredientTag {
    const TABLE: &'static str = "ingredient_tags";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::integer("ingredient_id"),
        ColumnSpec::integer("tag_id"),
    ];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.ingredient_id).push_bind(self.tag_id);
    }
}

// ============================================================================
// Shopping units
// ============================================================================

/// Preferred shopping unit; `unit_id` must belong to the same ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IngredientShoppingUnit {
    pub ingredient_id: i32,
    pub unit_id: Option<i32>,
}

impl TableModel for IngredientShoppingUnit {
    const TABLE: &'static str = "ingredient_shopping_units";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::integer("ingredient_id"),
        ColumnSpec::integer("unit_id").nullable(),
    ];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.ingredient_id).push_bind(self.unit_id);
    }
}
