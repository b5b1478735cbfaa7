//! Recipe ingestion: stage attachments, write rows, then move files into place.

use std::path::Path;

use diesel::prelude::*;
use diesel::upsert::excluded;
use recipeshare_core::{RecipeSubmission, StagedUpload};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{NewRecipe, NewRecipeCategory, NewRecipeIngredient, NewStepImage};
use crate::schema::{categories, ingredients, recipe_categories, recipe_ingredients, recipes, step_images};

/// Insert each ingredient name unless it already exists; returns ids in input order.
pub fn upsert_ingredients(conn: &mut PgConnection, names: &[String]) -> QueryResult<Vec<Uuid>> {
    names
        .iter()
        .map(|name| {
            diesel::insert_into(ingredients::table)
                .values(ingredients::name.eq(name))
                .on_conflict(ingredients::name)
                .do_update()
                .set(ingredients::name.eq(excluded(ingredients::name)))
                .returning(ingredients::id)
                .get_result(conn)
        })
        .collect()
}

/// Insert each category name unless it already exists; returns ids in input order.
pub fn upsert_categories(conn: &mut PgConnection, names: &[String]) -> QueryResult<Vec<Uuid>> {
    names
        .iter()
        .map(|name| {
            diesel::insert_into(categories::table)
                .values(categories::name.eq(name))
                .on_conflict(categories::name)
                .do_update()
                .set(categories::name.eq(excluded(categories::name)))
                .returning(categories::id)
                .get_result(conn)
        })
        .collect()
}

pub fn link_ingredients(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    ingredient_ids: &[Uuid],
) -> QueryResult<usize> {
    let rows: Vec<NewRecipeIngredient> = ingredient_ids
        .iter()
        .map(|&ingredient_id| NewRecipeIngredient {
            recipe_id,
            ingredient_id,
        })
        .collect();
    if rows.is_empty() {
        return Ok(0);
    }

    diesel::insert_into(recipe_ingredients::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)
}

pub fn link_categories(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    category_ids: &[Uuid],
) -> QueryResult<usize> {
    let rows: Vec<NewRecipeCategory> = category_ids
        .iter()
        .map(|&category_id| NewRecipeCategory {
            recipe_id,
            category_id,
        })
        .collect();
    if rows.is_empty() {
        return Ok(0);
    }

    diesel::insert_into(recipe_categories::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)
}

/// Persist a validated submission with `creator_id` as its creator.
///
/// Attachments are staged under the media root first. Rows are written in
/// one transaction and the staged files are moved into place before it
/// commits, so on any error neither rows nor files survive.
pub fn ingest_recipe(
    conn: &mut PgConnection,
    media_root: &Path,
    creator_id: Uuid,
    submission: &RecipeSubmission,
) -> Result<Uuid, ApiError> {
    let mut staged = StagedUpload::new(media_root)?;

    if let Some(data) = &submission.thumbnail {
        staged.stage_thumbnail(data)?;
    }
    if let Some(archive) = &submission.step_archive {
        let steps = submission.steps();
        let matched = staged.stage_steps(archive, &steps)?;
        tracing::debug!(steps = steps.len(), matched, "Staged step images");
    }
    if let Some(archive) = &submission.ingredient_archive {
        let matched = staged.stage_ingredient_images(archive, &submission.ingredients)?;
        tracing::debug!(ingredients = submission.ingredients.len(), matched, "Staged ingredient images");
    }

    let recipe_id = Uuid::new_v4();
    let plan = staged.plan(&submission.title, recipe_id);

    let result = conn.transaction::<_, ApiError, _>(|conn| {
        diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                id: recipe_id,
                creator_id: Some(creator_id),
                title: &submission.title,
                description: &submission.description,
                instructions: &submission.instructions,
                prep_duration: submission.prep_duration,
                cook_duration: submission.cook_duration,
                thumbnail_image: plan.thumbnail.as_deref(),
                storage_dir: Some(plan.recipe_dir.as_str()),
            })
            .execute(conn)?;

        let ingredient_ids = upsert_ingredients(conn, &submission.ingredients)?;
        link_ingredients(conn, recipe_id, &ingredient_ids)?;

        let category_ids = upsert_categories(conn, &submission.categories)?;
        link_categories(conn, recipe_id, &category_ids)?;

        let step_rows: Vec<NewStepImage> = plan
            .steps
            .iter()
            .map(|(step_number, image)| NewStepImage {
                recipe_id,
                step_number: *step_number,
                image,
            })
            .collect();
        if !step_rows.is_empty() {
            diesel::insert_into(step_images::table)
                .values(&step_rows)
                .execute(conn)?;
        }

        for (name, image) in &plan.ingredient_images {
            diesel::update(ingredients::table.filter(ingredients::name.eq(name)))
                .set(ingredients::image.eq(image))
                .execute(conn)?;
        }

        staged.commit(&plan)?;
        Ok(())
    });

    if let Err(e) = result {
        plan.discard(media_root);
        return Err(e);
    }

    tracing::info!(
        recipe_id = %recipe_id,
        ingredients = submission.ingredients.len(),
        categories = submission.categories.len(),
        step_images = plan.steps.len(),
        "Created recipe"
    );

    Ok(recipe_id)
}
