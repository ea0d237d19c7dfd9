use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::repo::{Category, Ingredient, SubCategory};
use crate::meals::repo::{DietType, Meal, MealTime};

/// Create payload. `ingredients`, `category` and `sub_category` accept
/// either catalog ids or names; names are resolved before insertion.
#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub image_url: Option<String>,
    pub category: String,
    pub sub_category: String,
    pub diet_type: DietType,
    pub total_kcal: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub meal_times: Vec<MealTime>,
    #[serde(default)]
    pub rating: f32,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateMealRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub diet_type: Option<DietType>,
    pub total_kcal: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub meal_times: Option<Vec<MealTime>>,
    pub rating: Option<f32>,
}

/// Meal with its references resolved, for detail views.
#[derive(Debug, Serialize)]
pub struct MealDetails {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub image_url: Option<String>,
    pub category: Option<Category>,
    pub sub_category: Option<SubCategory>,
    pub diet_type: DietType,
    pub total_kcal: i32,
    pub tags: Vec<String>,
    pub meal_times: Vec<String>,
    pub rating: f32,
}

/// Compact meal representation used by listings and recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealSummary {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub diet_type: DietType,
    pub total_kcal: i32,
    pub meal_times: Vec<String>,
    pub rating: f32,
}

impl From<&Meal> for MealSummary {
    fn from(m: &Meal) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            image_url: m.image_url.clone(),
            diet_type: m.diet_type,
            total_kcal: m.total_kcal,
            meal_times: m.meal_times.clone(),
            rating: m.rating,
        }
    }
}
