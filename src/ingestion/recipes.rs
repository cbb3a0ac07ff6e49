//! Crafting recipe files rendered as supplemental documents.
//!
//! Each file under the recipe directory is a vanilla crafting JSON whose
//! `result.id` names the output item. Recipes become small synthetic
//! documents (category `recipes`) so they flow through the same
//! chunk → batch → embed → upsert path as scraped articles.

use std::path::Path;

use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};

use crate::types::{Document, RagError};

/// Fixed category tag for recipe-derived documents.
pub const RECIPE_CATEGORY: &str = "recipes";

/// Key facts lifted from one crafting file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipe {
    /// Output item id, e.g. `minecraft:oak_planks`.
    pub item: String,
    /// Ingredient item ids, deduplicated, in file order.
    pub ingredients: Vec<String>,
    /// File stem the recipe came from.
    pub name: String,
}

/// Loads every parseable recipe under `dir`. An absent directory is an
/// empty catalog; malformed files are logged and skipped.
pub async fn load_recipes(dir: impl AsRef<Path>) -> Result<Vec<Recipe>, RagError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        info!(dir = %dir.display(), "no recipe directory, skipping");
        return Ok(Vec::new());
    }

    let mut recipes = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let data = fs::read_to_string(&path).await?;
        match parse_recipe(&data, &path) {
            Some(recipe) => recipes.push(recipe),
            None => warn!(file = %path.display(), "unusable recipe file, skipping"),
        }
    }

    recipes.sort_by(|a, b| a.name.cmp(&b.name));
    info!(count = recipes.len(), "loaded recipe catalog");
    Ok(recipes)
}

fn parse_recipe(data: &str, path: &Path) -> Option<Recipe> {
    let value: Value = serde_json::from_str(data).ok()?;
    let item = value.get("result")?.get("id")?.as_str()?.to_string();

    let mut ingredients = Vec::new();
    // Shaped recipes carry a `key` map, shapeless ones an `ingredients` list.
    if let Some(key) = value.get("key").and_then(Value::as_object) {
        for entry in key.values() {
            push_ingredient(&mut ingredients, entry);
        }
    }
    if let Some(list) = value.get("ingredients").and_then(Value::as_array) {
        for entry in list {
            push_ingredient(&mut ingredients, entry);
        }
    }

    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("recipe")
        .to_string();

    Some(Recipe {
        item,
        ingredients,
        name,
    })
}

fn push_ingredient(ingredients: &mut Vec<String>, entry: &Value) {
    let id = entry
        .as_str()
        .or_else(|| entry.get("item").and_then(Value::as_str));
    if let Some(id) = id {
        let id = id.to_string();
        if !ingredients.contains(&id) {
            ingredients.push(id);
        }
    }
}

/// Renders recipes as documents for the standard ingestion path.
pub fn recipes_to_documents(recipes: &[Recipe]) -> Vec<Document> {
    recipes
        .iter()
        .map(|recipe| {
            let item = display_name(&recipe.item);
            let content = if recipe.ingredients.is_empty() {
                format!("Crafting recipe for {item}. The result is {}.", recipe.item)
            } else {
                let ingredients: Vec<String> = recipe
                    .ingredients
                    .iter()
                    .map(|id| display_name(id))
                    .collect();
                format!(
                    "Crafting recipe for {item}. The result is {}. Ingredients: {}.",
                    recipe.item,
                    ingredients.join(", ")
                )
            };
            Document::new(
                format!("Recipe: {item}"),
                format!("recipe://{}", recipe.name),
                content,
            )
            .with_category(RECIPE_CATEGORY)
        })
        .collect()
}

/// `minecraft:oak_planks` → `oak planks`.
fn display_name(id: &str) -> String {
    id.rsplit(':').next().unwrap_or(id).replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn absent_directory_is_an_empty_catalog() {
        let dir = tempdir().unwrap();
        let recipes = load_recipes(dir.path().join("missing")).await.unwrap();
        assert!(recipes.is_empty());
    }

    #[tokio::test]
    async fn malformed_files_are_skipped() {
        let dir = tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("oak_planks.json"),
            r#"{"type": "minecraft:crafting_shapeless",
                "ingredients": [{"item": "minecraft:oak_log"}],
                "result": {"id": "minecraft:oak_planks", "count": 4}}"#,
        )
        .await
        .unwrap();
        tokio::fs::write(dir.path().join("broken.json"), "{not json")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("no_result.json"), r#"{"type": "smelting"}"#)
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "ignore me")
            .await
            .unwrap();

        let recipes = load_recipes(dir.path()).await.unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].item, "minecraft:oak_planks");
        assert_eq!(recipes[0].ingredients, vec!["minecraft:oak_log"]);
        assert_eq!(recipes[0].name, "oak_planks");
    }

    #[test]
    fn shaped_recipes_collect_key_ingredients() {
        let recipe = parse_recipe(
            r#"{"key": {"P": {"item": "minecraft:oak_planks"},
                        "S": {"item": "minecraft:stick"}},
                "pattern": ["PPP", " S ", " S "],
                "result": {"id": "minecraft:oak_sign", "count": 3}}"#,
            Path::new("oak_sign.json"),
        )
        .unwrap();
        assert_eq!(recipe.item, "minecraft:oak_sign");
        assert_eq!(recipe.ingredients.len(), 2);
        assert!(recipe.ingredients.contains(&"minecraft:stick".to_string()));
    }

    #[test]
    fn documents_carry_the_recipe_category() {
        let recipes = vec![Recipe {
            item: "minecraft:oak_planks".to_string(),
            ingredients: vec!["minecraft:oak_log".to_string()],
            name: "oak_planks".to_string(),
        }];
        let docs = recipes_to_documents(&recipes);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].category, RECIPE_CATEGORY);
        assert_eq!(docs[0].url, "recipe://oak_planks");
        assert!(docs[0].content.contains("oak log"));
    }
}
