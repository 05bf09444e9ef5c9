//! Table name to codec lookup

use super::{
    DailyLogEntry, Food, FoodIngredient, FoodTag, Ingredient, IngredientShoppingUnit,
    IngredientTag, IngredientUnit, ModelCodec, Nutrition, Plan, PossibleFoodTag,
    PossibleIngredientTag, StoredFood, TableCodec, TableModel,
};
use crate::error::{SyncError, SyncResult};
use std::collections::BTreeMap;

/// Every table the engine knows how to load and dump
pub struct ModelRegistry {
    codecs: BTreeMap<&'static str, Box<dyn TableCodec>>,
}

impl ModelRegistry {
    pub fn empty() -> Self {
        Self {
            codecs: BTreeMap::new(),
        }
    }

    /// Registry of the nutrition schema
    pub fn nutrition() -> Self {
        let mut registry = Self::empty();
        registry
            .register::<Ingredient>()
            .register::<IngredientUnit>()
            .register::<Nutrition>()
            .register::<PossibleIngredientTag>()
            .register::<IngredientTag>()
            .register::<IngredientShoppingUnit>()
            .register::<Food>()
            .register::<FoodIngredient>()
            .register::<PossibleFoodTag>()
            .register::<FoodTag>()
            .register::<Plan>()
            .register::<StoredFood>()
            .register::<DailyLogEntry>();
        registry
    }

    /// Add `M`, replacing any codec already mapped to its table
    pub fn register<M: TableModel>(&mut self) -> &mut Self {
        self.codecs.insert(M::TABLE, Box::new(ModelCodec::<M>::new()));
        self
    }

    pub fn lookup(&self, table: &str) -> Option<&dyn TableCodec> {
        self.codecs.get(table).map(|codec| codec.as_ref())
    }

    pub fn get(&self, table: &str) -> SyncResult<&dyn TableCodec> {
        self.lookup(table)
            .ok_or_else(|| SyncError::UnmappedTable(table.to_string()))
    }

    pub fn contains(&self, table: &str) -> bool {
        self.codecs.contains_key(table)
    }

    /// Mapped table names, sorted
    pub fn tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.codecs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::nutrition()
    }
}
