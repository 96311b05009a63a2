use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Number of ingredient/measure slot pairs carried by every API record.
pub const INGREDIENT_SLOTS: usize = 20;

/// A single dish from TheMealDB.
///
/// Records returned by listing endpoints (`filter.php`) are summaries: the
/// instructions and ingredient slots are simply absent. Nothing marks the
/// difference, so callers that need the full record fetch it by id.
///
/// Identity is the `id` alone; see [`Recipe::same_recipe`]. `PartialEq`
/// compares every field and is what the favorites round-trip relies on.
///
/// # Examples
///
/// ```
/// use mealdb_kit::Recipe;
///
/// let recipe: Recipe = serde_json::from_str(r#"{
///     "idMeal": "52977",
///     "strMeal": "Corba",
///     "strIngredient1": "Lentils",
///     "strMeasure1": "1 cup",
///     "strInstructions": "Pick through your lentils.\r\nRinse them."
/// }"#)?;
///
/// assert_eq!(recipe.ingredients()[0].name, "Lentils");
/// assert_eq!(recipe.instruction_steps().len(), 2);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRecipe", into = "RawRecipe")]
pub struct Recipe {
    id: String,
    name: String,
    thumbnail: Option<String>,
    instructions: Option<String>,
    /// Positional ingredient slots, always `INGREDIENT_SLOTS` long
    ingredient_slots: Vec<Option<String>>,
    /// Positional measure slots, always `INGREDIENT_SLOTS` long
    measure_slots: Vec<Option<String>>,
}

/// A non-empty ingredient line derived from a slot pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub name: String,
    pub measure: String,
}

impl Recipe {
    /// Creates a summary record with no instructions or ingredients.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Recipe {
            id: id.into(),
            name: name.into(),
            thumbnail: None,
            instructions: None,
            ingredient_slots: vec![None; INGREDIENT_SLOTS],
            measure_slots: vec![None; INGREDIENT_SLOTS],
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Sets the ingredient and measure at a zero-indexed slot.
    ///
    /// Slots beyond `INGREDIENT_SLOTS` are ignored, matching what the API
    /// can express.
    pub fn with_slot(
        mut self,
        index: usize,
        ingredient: Option<&str>,
        measure: Option<&str>,
    ) -> Self {
        if index < INGREDIENT_SLOTS {
            self.ingredient_slots[index] = ingredient.map(str::to_string);
            self.measure_slots[index] = measure.map(str::to_string);
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Two records describe the same recipe when their ids match,
    /// regardless of how complete either one is.
    pub fn same_recipe(&self, other: &Recipe) -> bool {
        self.id == other.id
    }

    /// Returns the ingredient lines in slot order.
    ///
    /// Slots are paired positionally and trimmed. A slot whose ingredient is
    /// absent or blank is dropped; a missing measure becomes an empty string.
    pub fn ingredients(&self) -> Vec<Ingredient> {
        self.ingredient_slots
            .iter()
            .zip(self.measure_slots.iter())
            .filter_map(|(ingredient, measure)| {
                let name = ingredient.as_deref()?.trim();
                if name.is_empty() {
                    return None;
                }
                Some(Ingredient {
                    name: name.to_string(),
                    measure: measure.as_deref().unwrap_or("").trim().to_string(),
                })
            })
            .collect()
    }

    /// Returns the instructions split into trimmed, non-empty lines.
    pub fn instruction_steps(&self) -> Vec<String> {
        let Some(instructions) = self.instructions.as_deref() else {
            return Vec::new();
        };
        instructions
            .split(['\n', '\r'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Wire shape of a recipe, shared by the API and the favorites blob.
#[derive(Serialize, Deserialize)]
struct RawRecipe {
    #[serde(rename = "idMeal")]
    id: String,
    #[serde(rename = "strMeal")]
    name: String,
    #[serde(rename = "strMealThumb", default, skip_serializing_if = "Option::is_none")]
    thumbnail: Option<String>,
    #[serde(
        rename = "strInstructions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    instructions: Option<String>,
    /// `strIngredientN` / `strMeasureN` and any field we don't model
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

fn ingredient_key(slot: usize) -> String {
    format!("strIngredient{}", slot + 1)
}

fn measure_key(slot: usize) -> String {
    format!("strMeasure{}", slot + 1)
}

impl From<RawRecipe> for Recipe {
    fn from(raw: RawRecipe) -> Self {
        let slot = |key: String| raw.rest.get(&key).and_then(Value::as_str).map(str::to_string);

        let ingredient_slots = (0..INGREDIENT_SLOTS).map(|i| slot(ingredient_key(i))).collect();
        let measure_slots = (0..INGREDIENT_SLOTS).map(|i| slot(measure_key(i))).collect();

        Recipe {
            id: raw.id,
            name: raw.name,
            thumbnail: raw.thumbnail,
            instructions: raw.instructions,
            ingredient_slots,
            measure_slots,
        }
    }
}

impl From<Recipe> for RawRecipe {
    fn from(recipe: Recipe) -> Self {
        let mut rest = BTreeMap::new();
        for (i, value) in recipe.ingredient_slots.into_iter().enumerate() {
            if let Some(value) = value {
                rest.insert(ingredient_key(i), Value::String(value));
            }
        }
        for (i, value) in recipe.measure_slots.into_iter().enumerate() {
            if let Some(value) = value {
                rest.insert(measure_key(i), Value::String(value));
            }
        }

        RawRecipe {
            id: recipe.id,
            name: recipe.name,
            thumbnail: recipe.thumbnail,
            instructions: recipe.instructions,
            rest,
        }
    }
}
