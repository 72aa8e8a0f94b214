use anyhow::Result;

use recipe_finder::ingredients;
use recipe_finder::mealdb::{MealDbClient, RecipeSource};

// Hits the public TheMealDB API; run with `cargo test -- --ignored`.
#[tokio::test]
#[ignore]
async fn mealdb_it_search_and_lookup() -> Result<()> {
    let client = MealDbClient::new();

    let recipes = client.search("Arrabiata").await?;
    assert!(!recipes.is_empty());
    let first = &recipes[0];
    println!("Found {} ({})", first.name, first.id);

    let detail = client.lookup(&first.id).await?.expect("lookup by search id");
    assert_eq!(detail.id, first.id);
    let lines = ingredients::derive(&detail);
    assert!(!lines.is_empty());
    assert!(lines.len() <= 20);

    assert!(client.search("zzzz-no-such-meal").await?.is_empty());
    assert!(client.lookup("0").await?.is_none());
    Ok(())
}
