use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::pagination::PageQuery;

/// Catalog ingredient. The id is an opaque string: part of the catalog was
/// imported keyed by free-form string ids and meal rows reference those
/// strings verbatim, so matching must go through `canonical_id`, never raw
/// equality against a typed key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub kind: String,
    pub kcal: Option<f64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubCategory {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
}

impl Ingredient {
    /// The full catalog, in stable insertion order. Small by design; the
    /// matcher normalizes names in-process.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, unit, kind, kcal, image_url FROM ingredients ORDER BY name",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list(db: &PgPool, page: &PageQuery) -> anyhow::Result<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, unit, kind, kcal, image_url FROM ingredients
             ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ingredients")
            .fetch_one(db)
            .await?;
        Ok(total)
    }

    pub async fn find_by_id(db: &PgPool, id: &str) -> anyhow::Result<Option<Ingredient>> {
        let row = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, unit, kind, kcal, image_url FROM ingredients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<Ingredient>> {
        let row = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, unit, kind, kcal, image_url FROM ingredients WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        unit: &str,
        kind: &str,
        kcal: Option<f64>,
        image_url: Option<&str>,
    ) -> anyhow::Result<Ingredient> {
        let row = sqlx::query_as::<_, Ingredient>(
            "INSERT INTO ingredients (id, name, unit, kind, kcal, image_url)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, name, unit, kind, kcal, image_url",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(unit)
        .bind(kind)
        .bind(kcal)
        .bind(image_url)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}

impl Category {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY name",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        description: Option<&str>,
    ) -> anyhow::Result<Category> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2)
             RETURNING id, name, description",
        )
        .bind(name)
        .bind(description)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}

impl SubCategory {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<SubCategory>> {
        let rows = sqlx::query_as::<_, SubCategory>(
            "SELECT id, name, category_id FROM sub_categories ORDER BY name",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<SubCategory>> {
        let row = sqlx::query_as::<_, SubCategory>(
            "SELECT id, name, category_id FROM sub_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<SubCategory>> {
        let row = sqlx::query_as::<_, SubCategory>(
            "SELECT id, name, category_id FROM sub_categories WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn create(db: &PgPool, name: &str, category_id: Uuid) -> anyhow::Result<SubCategory> {
        let row = sqlx::query_as::<_, SubCategory>(
            "INSERT INTO sub_categories (name, category_id) VALUES ($1, $2)
             RETURNING id, name, category_id",
        )
        .bind(name)
        .bind(category_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}
