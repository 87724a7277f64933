// Schema translation from Paprika's export layout to the body Mealie's
// `recipes/create` endpoint expects.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::record::RecipeRecord;

/// Tag attached to every imported recipe.
pub const IMPORT_TAG: &str = "Paprika";

const REQUIRED_FIELDS: [&str; 13] = [
    "name",
    "ingredients",
    "directions",
    "notes",
    "description",
    "source_url",
    "prep_time",
    "cook_time",
    "total_time",
    "servings",
    "rating",
    "created",
    "categories",
];

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("recipe is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("recipe has a field of the wrong type: {0}")]
    InvalidField(#[source] serde_json::Error),

    #[error("`created` timestamp {0:?} has no date/time separator")]
    MalformedTimestamp(String),
}

/// A Paprika recipe with every field the import needs. Fields that Mealie
/// receives unchanged keep whatever JSON value the export holds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaprikaRecipe {
    pub name: Value,
    pub ingredients: String,
    pub directions: String,
    pub notes: Value,
    pub description: Value,
    pub source_url: Value,
    pub prep_time: Value,
    pub cook_time: Value,
    pub total_time: Value,
    pub servings: Value,
    pub rating: Value,
    pub created: String,
    pub categories: Value,
    #[serde(default, deserialize_with = "string_only")]
    pub photo_data: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub image_url: Option<String>,
}

/// Keeps a value only if it is a JSON string; anything else means "none".
fn string_only<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealieNote {
    pub title: String,
    pub text: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealieInstruction {
    pub text: String,
}

/// Body of a Mealie `recipes/create` request. Field names follow Mealie,
/// including its mix of camelCase and snake_case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealieRecipe {
    #[serde(rename = "prepTime")]
    pub prep_time: Value,
    #[serde(rename = "recipeIngredient")]
    pub recipe_ingredient: Vec<String>,
    pub notes: Vec<MealieNote>,
    pub description: Value,
    #[serde(rename = "orgURL")]
    pub org_url: Value,
    #[serde(rename = "performTime")]
    pub perform_time: Value,
    #[serde(rename = "totalTime")]
    pub total_time: Value,
    pub recipe_yield: Value,
    pub name: Value,
    pub rating: Value,
    #[serde(rename = "dateAdded")]
    pub date_added: String,
    #[serde(rename = "recipeCategory")]
    pub recipe_category: Value,
    #[serde(rename = "recipeInstructions")]
    pub recipe_instructions: Vec<MealieInstruction>,
    pub tags: Vec<String>,
}

impl MealieRecipe {
    /// Recipe name for messages: the string itself, or its JSON text.
    pub fn display_name(&self) -> String {
        display_value(&self.name)
    }
}

/// Renders a JSON value for humans, without quotes around strings.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl PaprikaRecipe {
    pub fn from_record(record: &RecipeRecord) -> Result<Self, TranslationError> {
        if let Some(missing) = REQUIRED_FIELDS
            .into_iter()
            .find(|field| !record.contains_key(field))
        {
            return Err(TranslationError::MissingField(missing));
        }
        serde_json::from_value(Value::Object(record.as_map().clone()))
            .map_err(TranslationError::InvalidField)
    }

    pub fn to_mealie(&self) -> Result<MealieRecipe, TranslationError> {
        let date_added = match self.created.split_once(' ') {
            Some((date, _time)) => date.to_string(),
            None => return Err(TranslationError::MalformedTimestamp(self.created.clone())),
        };

        Ok(MealieRecipe {
            prep_time: self.prep_time.clone(),
            recipe_ingredient: self.ingredients.split('\n').map(str::to_string).collect(),
            notes: vec![MealieNote {
                title: String::new(),
                text: self.notes.clone(),
            }],
            description: self.description.clone(),
            org_url: self.source_url.clone(),
            perform_time: self.cook_time.clone(),
            total_time: self.total_time.clone(),
            recipe_yield: self.servings.clone(),
            name: self.name.clone(),
            rating: self.rating.clone(),
            date_added,
            recipe_category: self.categories.clone(),
            recipe_instructions: self
                .directions
                .split("\n\n")
                .map(|step| MealieInstruction {
                    text: step.to_string(),
                })
                .collect(),
            tags: vec![IMPORT_TAG.to_string()],
        })
    }

    /// Embedded photo, if the export carries a non-empty string.
    pub fn photo_data(&self) -> Option<&str> {
        self.photo_data.as_deref().filter(|data| !data.is_empty())
    }

    /// Original image location, if the export carries a non-empty string.
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.is_empty())
    }
}

pub fn translate(record: &RecipeRecord) -> Result<MealieRecipe, TranslationError> {
    PaprikaRecipe::from_record(record)?.to_mealie()
}
