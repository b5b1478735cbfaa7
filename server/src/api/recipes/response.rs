//! Recipe representation shared by the list, detail and create endpoints.

use crate::models::{Category, Ingredient, Recipe, StepImage};
use crate::schema::{categories, ingredients, recipe_categories, recipe_ingredients, step_images};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
    /// Path under `/media/`, if an image was uploaded
    pub image: Option<String>,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            image: ingredient.image,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StepImageResponse {
    pub step_number: i32,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub creator_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub prep_duration: i32,
    pub cook_duration: i32,
    pub thumbnail_image: Option<String>,
    pub ingredients: Vec<IngredientResponse>,
    pub categories: Vec<CategoryResponse>,
    pub step_images: Vec<StepImageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Build full representations for `recipes`, keeping their order.
///
/// Related rows are fetched with one query per relation, not per recipe.
pub fn load_recipe_responses(
    conn: &mut PgConnection,
    recipes: Vec<Recipe>,
) -> QueryResult<Vec<RecipeResponse>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();

    let ingredient_rows: Vec<(Uuid, Ingredient)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&ids))
        .order(ingredients::name.asc())
        .select((recipe_ingredients::recipe_id, Ingredient::as_select()))
        .load(conn)?;

    let category_rows: Vec<(Uuid, Category)> = recipe_categories::table
        .inner_join(categories::table)
        .filter(recipe_categories::recipe_id.eq_any(&ids))
        .order(categories::name.asc())
        .select((recipe_categories::recipe_id, Category::as_select()))
        .load(conn)?;

    let step_rows: Vec<StepImage> = step_images::table
        .filter(step_images::recipe_id.eq_any(&ids))
        .order(step_images::step_number.asc())
        .select(StepImage::as_select())
        .load(conn)?;

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<IngredientResponse>> = HashMap::new();
    for (recipe_id, ingredient) in ingredient_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(ingredient.into());
    }

    let mut categories_by_recipe: HashMap<Uuid, Vec<CategoryResponse>> = HashMap::new();
    for (recipe_id, category) in category_rows {
        categories_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(CategoryResponse {
                id: category.id,
                name: category.name,
            });
    }

    let mut steps_by_recipe: HashMap<Uuid, Vec<StepImageResponse>> = HashMap::new();
    for step in step_rows {
        steps_by_recipe
            .entry(step.recipe_id)
            .or_default()
            .push(StepImageResponse {
                step_number: step.step_number,
                image: step.image,
            });
    }

    Ok(recipes
        .into_iter()
        .map(|recipe| RecipeResponse {
            ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
            categories: categories_by_recipe.remove(&recipe.id).unwrap_or_default(),
            step_images: steps_by_recipe.remove(&recipe.id).unwrap_or_default(),
            id: recipe.id,
            creator_id: recipe.creator_id,
            title: recipe.title,
            description: recipe.description,
            instructions: recipe.instructions,
            prep_duration: recipe.prep_duration,
            cook_duration: recipe.cook_duration,
            thumbnail_image: recipe.thumbnail_image,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        })
        .collect())
}

/// Load one recipe with its relations, or `None` if it doesn't exist.
pub fn load_recipe_response(
    conn: &mut PgConnection,
    id: Uuid,
) -> QueryResult<Option<RecipeResponse>> {
    use crate::schema::recipes;

    let Some(recipe) = recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()?
    else {
        return Ok(None);
    };

    Ok(load_recipe_responses(conn, vec![recipe])?.pop())
}
