//! Records exchanged with TheMealDB.
//!
//! The remote API wraps every payload in a `{ "meals": ... }` envelope,
//! including the category listing. Envelopes are decoded here and unwrapped
//! by the client before anything reaches the coordinators.

mod category;
mod recipe;

pub use category::Category;
pub use recipe::{Ingredient, Recipe, INGREDIENT_SLOTS};

use serde::Deserialize;

/// `{ "meals": [Recipe] | null }`
#[derive(Debug, Deserialize)]
pub(crate) struct RecipeEnvelope {
    #[serde(default)]
    pub meals: Option<Vec<Recipe>>,
}

impl RecipeEnvelope {
    pub(crate) fn into_list(self) -> Vec<Recipe> {
        self.meals.unwrap_or_default()
    }

    pub(crate) fn into_first(self) -> Option<Recipe> {
        self.meals.and_then(|meals| meals.into_iter().next())
    }
}

/// `{ "meals": [Category] }`
#[derive(Debug, Deserialize)]
pub(crate) struct CategoryEnvelope {
    #[serde(default)]
    pub meals: Option<Vec<Category>>,
}

impl CategoryEnvelope {
    pub(crate) fn into_list(self) -> Vec<Category> {
        self.meals.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_null_meals_is_empty_list() {
        let envelope: RecipeEnvelope = serde_json::from_str(r#"{"meals": null}"#).unwrap();
        assert!(envelope.into_list().is_empty());
    }

    #[test]
    fn test_missing_meals_is_absent_record() {
        let envelope: RecipeEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.into_first().is_none());
    }

    #[test]
    fn test_first_record_is_unwrapped() {
        let envelope: RecipeEnvelope = serde_json::from_str(indoc! {r#"
            {"meals": [
                {"idMeal": "52772", "strMeal": "Teriyaki Chicken Casserole"},
                {"idMeal": "52773", "strMeal": "Honey Teriyaki Salmon"}
            ]}"#})
        .unwrap();
        let first = envelope.into_first().unwrap();
        assert_eq!(first.id(), "52772");
    }

    #[test]
    fn test_category_envelope() {
        let envelope: CategoryEnvelope = serde_json::from_str(indoc! {r#"
            {"meals": [{"strCategory": "Beef"}, {"strCategory": "Dessert"}]}"#})
        .unwrap();
        let names: Vec<String> = envelope
            .into_list()
            .into_iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["Beef", "Dessert"]);
    }
}
