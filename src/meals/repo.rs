use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::PageQuery;

/// Coarse nutritional goal tag attached to a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DietType {
    WeightLoss,
    WeightGain,
    EatClean,
}

impl DietType {
    pub fn as_str(self) -> &'static str {
        match self {
            DietType::WeightLoss => "weight_loss",
            DietType::WeightGain => "weight_gain",
            DietType::EatClean => "eat_clean",
        }
    }
}

impl fmt::Display for DietType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the daily eating occasions a meal is suitable for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealTime {
    Breakfast,
    Lunch,
    Dinner,
    Dessert,
}

impl MealTime {
    pub fn as_str(self) -> &'static str {
        match self {
            MealTime::Breakfast => "breakfast",
            MealTime::Lunch => "lunch",
            MealTime::Dinner => "dinner",
            MealTime::Dessert => "dessert",
        }
    }
}

impl FromStr for MealTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealTime::Breakfast),
            "lunch" => Ok(MealTime::Lunch),
            "dinner" => Ok(MealTime::Dinner),
            "dessert" => Ok(MealTime::Dessert),
            other => Err(format!("unknown meal time '{other}'")),
        }
    }
}

/// Catalog meal. `ingredient_ids` holds opaque ingredient id strings; some
/// historic rows carry inconsistent casing/whitespace, so any comparison
/// against the ingredient catalog must go through `canonical_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub ingredient_ids: Vec<String>,
    pub instructions: Vec<String>,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub sub_category_id: Uuid,
    pub diet_type: DietType,
    pub total_kcal: i32,
    pub tags: Vec<String>,
    pub meal_times: Vec<String>,
    pub rating: f32,
    pub created_at: OffsetDateTime,
}

const MEAL_COLUMNS: &str = "id, name, description, ingredient_ids, instructions, image_url, \
     category_id, sub_category_id, diet_type, total_kcal, tags, meal_times, rating, created_at";

pub struct NewMeal<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub ingredient_ids: Vec<String>,
    pub instructions: Vec<String>,
    pub image_url: Option<&'a str>,
    pub category_id: Uuid,
    pub sub_category_id: Uuid,
    pub diet_type: DietType,
    pub total_kcal: i32,
    pub tags: Vec<String>,
    pub meal_times: Vec<String>,
    pub rating: f32,
}

#[derive(Default)]
pub struct MealUpdate<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub ingredient_ids: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub image_url: Option<&'a str>,
    pub category_id: Option<Uuid>,
    pub sub_category_id: Option<Uuid>,
    pub diet_type: Option<DietType>,
    pub total_kcal: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub meal_times: Option<Vec<String>>,
    pub rating: Option<f32>,
}

impl Meal {
    pub async fn list(db: &PgPool, page: &PageQuery) -> anyhow::Result<Vec<Meal>> {
        let rows = sqlx::query_as::<_, Meal>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meals")
            .fetch_one(db)
            .await?;
        Ok(total)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Meal>> {
        let row = sqlx::query_as::<_, Meal>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Pool of candidate meals for ingredient matching, optionally restricted
    /// to a diet type. Intersection against matched ingredient ids happens
    /// in-process on canonical id strings, so no ingredient filter is pushed
    /// down here. Ordered for a stable tie-break.
    pub async fn matching_pool(
        db: &PgPool,
        diet_type: Option<DietType>,
    ) -> anyhow::Result<Vec<Meal>> {
        let rows = sqlx::query_as::<_, Meal>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals
             WHERE $1::text IS NULL OR diet_type = $1
             ORDER BY created_at, id"
        ))
        .bind(diet_type.map(DietType::as_str))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Top-rated meals for one meal-time bucket within a calorie window.
    pub async fn for_bucket(
        db: &PgPool,
        meal_time: MealTime,
        diet_type: DietType,
        kcal_min: i32,
        kcal_max: i32,
        limit: i64,
    ) -> anyhow::Result<Vec<Meal>> {
        let rows = sqlx::query_as::<_, Meal>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals
             WHERE $1 = ANY(meal_times)
               AND diet_type = $2
               AND total_kcal BETWEEN $3 AND $4
             ORDER BY rating DESC, created_at, id
             LIMIT $5"
        ))
        .bind(meal_time.as_str())
        .bind(diet_type)
        .bind(kcal_min)
        .bind(kcal_max)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(db: &PgPool, new: NewMeal<'_>) -> anyhow::Result<Meal> {
        let row = sqlx::query_as::<_, Meal>(&format!(
            "INSERT INTO meals (name, description, ingredient_ids, instructions, image_url,
                                category_id, sub_category_id, diet_type, total_kcal, tags,
                                meal_times, rating)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {MEAL_COLUMNS}"
        ))
        .bind(new.name)
        .bind(new.description)
        .bind(&new.ingredient_ids)
        .bind(&new.instructions)
        .bind(new.image_url)
        .bind(new.category_id)
        .bind(new.sub_category_id)
        .bind(new.diet_type)
        .bind(new.total_kcal)
        .bind(&new.tags)
        .bind(&new.meal_times)
        .bind(new.rating)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        update: MealUpdate<'_>,
    ) -> anyhow::Result<Option<Meal>> {
        let row = sqlx::query_as::<_, Meal>(&format!(
            "UPDATE meals SET
                name            = COALESCE($2, name),
                description     = COALESCE($3, description),
                ingredient_ids  = COALESCE($4, ingredient_ids),
                instructions    = COALESCE($5, instructions),
                image_url       = COALESCE($6, image_url),
                category_id     = COALESCE($7, category_id),
                sub_category_id = COALESCE($8, sub_category_id),
                diet_type       = COALESCE($9, diet_type),
                total_kcal      = COALESCE($10, total_kcal),
                tags            = COALESCE($11, tags),
                meal_times      = COALESCE($12, meal_times),
                rating          = COALESCE($13, rating)
             WHERE id = $1
             RETURNING {MEAL_COLUMNS}"
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.description)
        .bind(update.ingredient_ids)
        .bind(update.instructions)
        .bind(update.image_url)
        .bind(update.category_id)
        .bind(update.sub_category_id)
        .bind(update.diet_type)
        .bind(update.total_kcal)
        .bind(update.tags)
        .bind(update.meal_times)
        .bind(update.rating)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Meal>> {
        let row = sqlx::query_as::<_, Meal>(&format!(
            "DELETE FROM meals WHERE id = $1 RETURNING {MEAL_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_time_parses_case_insensitively() {
        assert_eq!("Breakfast".parse::<MealTime>().unwrap(), MealTime::Breakfast);
        assert_eq!(" dinner ".parse::<MealTime>().unwrap(), MealTime::Dinner);
        assert!("brunch".parse::<MealTime>().is_err());
    }

    #[test]
    fn diet_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DietType::WeightLoss).unwrap(),
            "\"weight_loss\""
        );
        assert_eq!(
            serde_json::from_str::<DietType>("\"eat_clean\"").unwrap(),
            DietType::EatClean
        );
    }
}
