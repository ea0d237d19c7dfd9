use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub unit: String,
    pub kind: String,
    pub kcal: Option<f64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Sub-category creation accepts the parent category by id or by name.
#[derive(Debug, Deserialize)]
pub struct CreateSubCategoryRequest {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
}
