use anyhow::Result;
use chrono::{Duration, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use recipe_finder::error::{SourceError, StoreError};
use recipe_finder::mealdb::RecipeSource;
use recipe_finder::model::{FavoriteEntry, NewFavorite, Recipe};
use recipe_finder::store::{FavoriteStore, Identity, Unconfigured};
use recipe_finder::views::{
    DetailState, DetailView, FavoriteToggle, FavoritesState, FavoritesView, Notice, SearchState,
    SearchView,
};

fn identity() -> Identity {
    Identity {
        user_id: Uuid::new_v4(),
        email: Some("cook@example.com".into()),
        access_token: "jwt".into(),
        refresh_token: None,
        expires_at: None,
    }
}

fn recipe(id: &str, name: &str) -> Recipe {
    let mut recipe = Recipe {
        id: id.into(),
        name: name.into(),
        thumbnail_url: Some(format!("https://img/{}.jpg", id)),
        instructions: "Step one.\nStep two.".into(),
        ..Default::default()
    };
    recipe.ingredients[0] = Some("Pasta".into());
    recipe.measures[0] = Some(" 200 g ".into());
    recipe.ingredients[1] = Some(" ".into());
    recipe
}

fn entry(user_id: Uuid, recipe_id: &str, age_secs: i64) -> FavoriteEntry {
    FavoriteEntry {
        id: Uuid::new_v4(),
        user_id,
        recipe_id: recipe_id.into(),
        recipe_name: format!("Recipe {}", recipe_id),
        recipe_image: None,
        created_at: Utc::now() - Duration::seconds(age_secs),
    }
}

fn transport_error() -> SourceError {
    SourceError::Status {
        status: reqwest::StatusCode::BAD_GATEWAY,
        body: "upstream down".into(),
    }
}

fn rejected() -> StoreError {
    StoreError::Rejected {
        status: reqwest::StatusCode::UNAUTHORIZED,
        message: "JWT expired".into(),
    }
}

#[derive(Clone, Default)]
struct RecordingSource {
    searches: Arc<Mutex<VecDeque<Result<Vec<Recipe>, SourceError>>>>,
    lookups: Arc<Mutex<VecDeque<Result<Option<Recipe>, SourceError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingSource {
    fn with_search(response: Result<Vec<Recipe>, SourceError>) -> Self {
        let source = Self::default();
        source.searches.try_lock().unwrap().push_back(response);
        source
    }

    fn with_lookup(response: Result<Option<Recipe>, SourceError>) -> Self {
        let source = Self::default();
        source.lookups.try_lock().unwrap().push_back(response);
        source
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl RecipeSource for RecordingSource {
    async fn search(&self, term: &str) -> Result<Vec<Recipe>, SourceError> {
        self.calls.lock().await.push(format!("search:{}", term));
        self.searches.lock().await.pop_front().unwrap_or_else(|| Ok(vec![]))
    }

    async fn lookup(&self, id: &str) -> Result<Option<Recipe>, SourceError> {
        self.calls.lock().await.push(format!("lookup:{}", id));
        self.lookups.lock().await.pop_front().unwrap_or(Ok(None))
    }
}

/// In-memory favorites table that records every call and can be told to fail.
#[derive(Clone, Default)]
struct RecordingStore {
    rows: Arc<Mutex<Vec<FavoriteEntry>>>,
    failures: Arc<Mutex<VecDeque<StoreError>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingStore {
    fn with_rows(rows: Vec<FavoriteEntry>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            ..Default::default()
        }
    }

    async fn fail_next(&self, err: StoreError) {
        self.failures.lock().await.push_back(err);
    }

    async fn record(&self, call: String) -> Result<(), StoreError> {
        self.calls.lock().await.push(call);
        // Let a concurrently polled future observe the in-flight call.
        tokio::task::yield_now().await;
        match self.failures.lock().await.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn rows(&self) -> Vec<FavoriteEntry> {
        self.rows.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl FavoriteStore for RecordingStore {
    async fn list(&self, identity: &Identity) -> Result<Vec<FavoriteEntry>, StoreError> {
        self.record("list".into()).await?;
        let mut rows: Vec<FavoriteEntry> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|r| r.user_id == identity.user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find(
        &self,
        identity: &Identity,
        recipe_id: &str,
    ) -> Result<Option<FavoriteEntry>, StoreError> {
        self.record(format!("find:{}", recipe_id)).await?;
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|r| r.user_id == identity.user_id && r.recipe_id == recipe_id)
            .cloned())
    }

    async fn insert(
        &self,
        _identity: &Identity,
        favorite: &NewFavorite,
    ) -> Result<FavoriteEntry, StoreError> {
        self.record(format!("insert:{}", favorite.recipe_id)).await?;
        let row = FavoriteEntry {
            id: Uuid::new_v4(),
            user_id: favorite.user_id,
            recipe_id: favorite.recipe_id.clone(),
            recipe_name: favorite.recipe_name.clone(),
            recipe_image: favorite.recipe_image.clone(),
            created_at: Utc::now(),
        };
        self.rows.lock().await.push(row.clone());
        Ok(row)
    }

    async fn remove(&self, identity: &Identity, recipe_id: &str) -> Result<(), StoreError> {
        self.record(format!("delete:{}", recipe_id)).await?;
        self.rows
            .lock()
            .await
            .retain(|r| !(r.user_id == identity.user_id && r.recipe_id == recipe_id));
        Ok(())
    }
}

// ---- search ----

#[tokio::test]
async fn blank_search_is_a_no_op() {
    let source = RecordingSource::with_search(Ok(vec![recipe("1", "Pasta Bake")]));
    let mut view = SearchView::new();
    assert!(view.submit(&source, "pasta").await);
    assert_eq!(view.cards().len(), 1);

    assert!(!view.submit(&source, "   ").await);
    assert_eq!(source.calls().await, vec!["search:pasta"]);
    assert_eq!(view.cards().len(), 1);
    assert_eq!(view.cards()[0].recipe.id, "1");
}

#[tokio::test]
async fn search_with_no_matches_is_not_an_error() {
    let source = RecordingSource::with_search(Ok(vec![]));
    let mut view = SearchView::new();
    view.submit(&source, " pasta ").await;
    match view.state() {
        SearchState::NoResults { term } => assert_eq!(term, "pasta"),
        other => panic!("unexpected state {:?}", other),
    }
}

#[tokio::test]
async fn search_failure_sets_error_message() {
    let source = RecordingSource::with_search(Err(transport_error()));
    let mut view = SearchView::new();
    view.submit(&source, "curry").await;
    match view.state() {
        SearchState::Failed(msg) => assert_eq!(msg, "Failed to fetch recipes. Please try again."),
        other => panic!("unexpected state {:?}", other),
    }
}

#[tokio::test]
async fn search_cards_start_unfavorited() {
    let source = RecordingSource::with_search(Ok(vec![recipe("1", "A"), recipe("2", "B")]));
    let mut view = SearchView::new();
    view.submit(&source, "a").await;
    assert!(view.cards().iter().all(|c| !c.favorite.is_favorited()));
}

// ---- detail ----

#[tokio::test]
async fn detail_not_found_is_distinct_from_failure() -> Result<()> {
    let store = RecordingStore::default();

    let source = RecordingSource::with_lookup(Ok(None));
    let mut view = DetailView::new();
    view.load(&source, &store, None, "999").await;
    assert!(matches!(view.state(), DetailState::NotFound));

    let source = RecordingSource::with_lookup(Err(transport_error()));
    let mut view = DetailView::new();
    view.load(&source, &store, None, "999").await;
    match view.state() {
        DetailState::Failed(msg) => assert_eq!(msg, "Failed to load recipe"),
        other => panic!("unexpected state {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn detail_derives_ingredients_and_status() {
    let me = identity();
    let store = RecordingStore::with_rows(vec![entry(me.user_id, "52772", 10)]);
    let source = RecordingSource::with_lookup(Ok(Some(recipe("52772", "Teriyaki"))));
    let mut view = DetailView::new();
    view.load(&source, &store, Some(&me), "52772").await;

    let DetailState::Ready(detail) = view.state() else {
        panic!("recipe should load");
    };
    assert!(detail.favorite.is_favorited());
    assert_eq!(detail.ingredients.len(), 1);
    assert_eq!(detail.ingredients[0].measure, "200 g");
    assert_eq!(detail.steps(), vec!["Step one.", "Step two."]);
    assert_eq!(store.calls().await, vec!["find:52772"]);
}

#[tokio::test]
async fn detail_status_errors_default_to_not_favorited() {
    let me = identity();
    let store = RecordingStore::with_rows(vec![entry(me.user_id, "52772", 10)]);
    store.fail_next(rejected()).await;
    let source = RecordingSource::with_lookup(Ok(Some(recipe("52772", "Teriyaki"))));
    let mut view = DetailView::new();
    view.load(&source, &store, Some(&me), "52772").await;
    let DetailState::Ready(detail) = view.state() else {
        panic!("recipe should load");
    };
    assert!(!detail.favorite.is_favorited());
}

#[tokio::test]
async fn detail_without_identity_skips_status_lookup() {
    let store = RecordingStore::default();
    let source = RecordingSource::with_lookup(Ok(Some(recipe("1", "A"))));
    let mut view = DetailView::new();
    view.load(&source, &store, None, "1").await;
    assert!(matches!(view.state(), DetailState::Ready(_)));
    assert!(store.calls().await.is_empty());
}

// ---- toggle ----

#[tokio::test]
async fn toggle_twice_restores_original_flag() {
    let me = identity();
    let store = RecordingStore::default();
    let toggle = FavoriteToggle::new(recipe("7", "Soup").to_ref(), false);

    assert_eq!(toggle.toggle(&store, Some(&me)).await, Ok(true));
    assert_eq!(store.rows().await.len(), 1);
    assert_eq!(store.rows().await[0].recipe_image.as_deref(), Some("https://img/7.jpg"));

    assert_eq!(toggle.toggle(&store, Some(&me)).await, Ok(false));
    assert!(store.rows().await.is_empty());
    assert_eq!(store.calls().await, vec!["insert:7", "delete:7"]);
}

#[tokio::test]
async fn toggle_requires_identity() {
    let store = RecordingStore::default();
    let toggle = FavoriteToggle::new(recipe("7", "Soup").to_ref(), false);
    assert_eq!(toggle.toggle(&store, None).await, Err(Notice::LoginRequired));
    assert!(store.calls().await.is_empty());
    assert!(!toggle.is_favorited());
}

#[tokio::test]
async fn toggle_store_error_leaves_flag_unchanged() {
    let me = identity();
    let store = RecordingStore::default();
    store.fail_next(rejected()).await;
    let toggle = FavoriteToggle::new(recipe("7", "Soup").to_ref(), true);
    assert_eq!(toggle.toggle(&store, Some(&me)).await, Err(Notice::SaveFailed));
    assert!(toggle.is_favorited());
    assert!(!toggle.is_busy());
}

#[tokio::test]
async fn toggle_refuses_while_in_flight() {
    let me = identity();
    let store = RecordingStore::default();
    let toggle = FavoriteToggle::new(recipe("7", "Soup").to_ref(), false);

    let (first, second) = futures::join!(
        toggle.toggle(&store, Some(&me)),
        toggle.toggle(&store, Some(&me))
    );
    assert_eq!(first, Ok(true));
    assert_eq!(second, Err(Notice::Busy));
    assert_eq!(store.calls().await, vec!["insert:7"]);
    assert!(!toggle.is_busy());
}

#[tokio::test]
async fn unconfigured_store_surfaces_save_failure() {
    let me = identity();
    let toggle = FavoriteToggle::new(recipe("7", "Soup").to_ref(), false);
    assert_eq!(toggle.toggle(&Unconfigured, Some(&me)).await, Err(Notice::SaveFailed));
}

// ---- favorites list ----

#[tokio::test]
async fn empty_favorites_is_its_own_state() {
    let me = identity();
    let store = RecordingStore::default();
    let mut view = FavoritesView::new();
    assert_eq!(view.state(), &FavoritesState::Loading);
    view.load(&store, Some(&me)).await;
    assert_eq!(view.state(), &FavoritesState::Empty);
    assert_eq!(view.summary(), "You haven't saved any favorite recipes yet.");
}

#[tokio::test]
async fn favorites_failure_and_signed_out() {
    let store = RecordingStore::default();
    store.fail_next(rejected()).await;
    let mut view = FavoritesView::new();
    view.load(&store, Some(&identity())).await;
    assert_eq!(view.state(), &FavoritesState::Failed("Failed to load favorites".into()));

    let mut view = FavoritesView::new();
    view.load(&store, None).await;
    assert_eq!(view.state(), &FavoritesState::SignedOut);
}

#[tokio::test]
async fn favorites_are_newest_first_and_scoped_to_user() {
    let me = identity();
    let other = identity();
    let store = RecordingStore::with_rows(vec![
        entry(me.user_id, "old", 300),
        entry(other.user_id, "theirs", 5),
        entry(me.user_id, "new", 10),
    ]);
    let mut view = FavoritesView::new();
    view.load(&store, Some(&me)).await;
    let ids: Vec<&str> = view.entries().iter().map(|e| e.recipe_id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
    assert_eq!(view.summary(), "You have 2 favorite recipes.");
}

#[tokio::test]
async fn remove_filters_locally_without_refetch() {
    let me = identity();
    let store = RecordingStore::with_rows(vec![
        entry(me.user_id, "a", 30),
        entry(me.user_id, "b", 20),
        entry(me.user_id, "c", 10),
    ]);
    let mut view = FavoritesView::new();
    view.load(&store, Some(&me)).await;

    view.remove(&store, Some(&me), "b").await.unwrap();
    let ids: Vec<&str> = view.entries().iter().map(|e| e.recipe_id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a"]);
    assert_eq!(store.calls().await, vec!["list", "delete:b"]);
}

#[tokio::test]
async fn remove_failure_keeps_list() {
    let me = identity();
    let store = RecordingStore::with_rows(vec![entry(me.user_id, "a", 30)]);
    let mut view = FavoritesView::new();
    view.load(&store, Some(&me)).await;

    store.fail_next(rejected()).await;
    assert_eq!(view.remove(&store, Some(&me), "a").await, Err(Notice::RemoveFailed));
    assert_eq!(view.entries().len(), 1);

    view.remove(&store, Some(&me), "a").await.unwrap();
    assert_eq!(view.state(), &FavoritesState::Empty);
}
