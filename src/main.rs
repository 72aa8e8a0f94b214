use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use recipe_finder::config::{self, Config};
use recipe_finder::mealdb::MealDbClient;
use recipe_finder::session;
use recipe_finder::store::{FavoriteStore, Identity, SupabaseClient, Unconfigured};
use recipe_finder::views::{
    DetailState, DetailView, FavoritesState, FavoritesView, RecipeDetail, SearchState, SearchView,
};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file (defaults to ./config.yaml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search recipes by name
    Search { term: String },
    /// Show a recipe with ingredients, steps and favorite status
    Show { id: String },
    /// Toggle a recipe in or out of your favorites
    Favorite { id: String },
    /// List your favorite recipes
    Favorites,
    /// Remove a recipe from your favorites
    Remove { recipe_id: String },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Print the signed-in user
    Whoami,
    /// Print an example config file
    ExampleConfig,
}

struct App {
    cfg: Config,
    recipes: MealDbClient,
    backend: Option<SupabaseClient>,
    favorites: Arc<dyn FavoriteStore>,
}

impl App {
    fn new(cfg: Config) -> Result<Self> {
        let recipes = MealDbClient::from_config(&cfg)?;
        let backend = match SupabaseClient::from_config(&cfg) {
            Ok(client) => Some(client),
            Err(err) => {
                warn!(%err, "favorites store unavailable; favorites and sign-in are disabled");
                None
            }
        };
        let favorites: Arc<dyn FavoriteStore> = match &backend {
            Some(client) => Arc::new(client.clone()),
            None => Arc::new(Unconfigured),
        };
        Ok(Self {
            cfg,
            recipes,
            backend,
            favorites,
        })
    }

    fn identity(&self) -> Result<Option<Identity>> {
        session::load(&self.cfg.app.data_dir)
    }

    fn backend(&self) -> Result<&SupabaseClient> {
        self.backend
            .as_ref()
            .ok_or_else(|| anyhow!("Supabase not configured"))
    }
}

/// Directives used when `RUST_LOG` is unset; keeps startup warnings visible.
const DEFAULT_LOG_FILTER: &str = "warn";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::ExampleConfig = args.command {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(args.config.as_deref())?;
    cfg.ensure_dirs()?;
    let app = App::new(cfg)?;

    match args.command {
        Command::Search { term } => search(&app, &term).await,
        Command::Show { id } => show(&app, &id).await,
        Command::Favorite { id } => favorite(&app, &id).await,
        Command::Favorites => favorites(&app).await,
        Command::Remove { recipe_id } => remove(&app, &recipe_id).await,
        Command::Signup { email, password } => {
            match app.backend()?.sign_up(&email, &password).await? {
                Some(identity) => {
                    session::save(&app.cfg.app.data_dir, &identity)?;
                    println!("Signed up and signed in as {}", email);
                }
                None => println!("Check {} for a confirmation link, then log in.", email),
            }
            Ok(())
        }
        Command::Login { email, password } => {
            let identity = app.backend()?.sign_in_with_password(&email, &password).await?;
            session::save(&app.cfg.app.data_dir, &identity)?;
            println!("Signed in as {}", identity.email.as_deref().unwrap_or(&email));
            Ok(())
        }
        Command::Logout => {
            if let (Some(identity), Some(backend)) = (app.identity()?, app.backend.as_ref()) {
                if let Err(err) = backend.sign_out(&identity).await {
                    warn!(%err, "sign out request failed; clearing local session anyway");
                }
            }
            session::clear(&app.cfg.app.data_dir)?;
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            match app.identity()? {
                Some(identity) => println!(
                    "{} ({})",
                    identity.email.as_deref().unwrap_or("unknown email"),
                    identity.user_id
                ),
                None => println!("Not signed in."),
            }
            Ok(())
        }
        Command::ExampleConfig => Ok(()),
    }
}

async fn search(app: &App, term: &str) -> Result<()> {
    let mut view = SearchView::new();
    if !view.submit(&app.recipes, term).await {
        println!("Enter a search term.");
        return Ok(());
    }
    match view.state() {
        SearchState::Results(cards) => {
            for card in cards {
                let r = &card.recipe;
                println!(
                    "{:>6}  {}  [{} / {}]",
                    r.id,
                    r.name,
                    r.category.as_deref().unwrap_or("-"),
                    r.area.as_deref().unwrap_or("-")
                );
            }
        }
        SearchState::NoResults { term } => {
            println!("No recipes found for \"{}\". Try a different search term.", term)
        }
        SearchState::Failed(message) => println!("{}", message),
        SearchState::Idle => {}
    }
    Ok(())
}

async fn show(app: &App, id: &str) -> Result<()> {
    let identity = app.identity()?;
    let mut view = DetailView::new();
    view.load(&app.recipes, app.favorites.as_ref(), identity.as_ref(), id)
        .await;
    match view.state() {
        DetailState::Ready(detail) => print_detail(detail, identity.is_some()),
        DetailState::NotFound => println!("Recipe not found"),
        DetailState::Failed(message) => println!("{}", message),
        DetailState::Loading => {}
    }
    Ok(())
}

fn print_detail(detail: &RecipeDetail, signed_in: bool) {
    let r = &detail.recipe;
    println!("{}", r.name);
    let mut meta = vec![];
    if let Some(category) = &r.category {
        meta.push(category.clone());
    }
    if let Some(area) = &r.area {
        meta.push(area.clone());
    }
    if !r.tags.is_empty() {
        meta.push(r.tags.join(", "));
    }
    if !meta.is_empty() {
        println!("{}", meta.join(" | "));
    }
    if signed_in {
        let mark = if detail.favorite.is_favorited() { "♥ favorited" } else { "♡ not favorited" };
        println!("{}", mark);
    }
    println!();
    println!("Ingredients");
    for line in &detail.ingredients {
        if line.measure.is_empty() {
            println!("  - {}", line.ingredient);
        } else {
            println!("  - {} {}", line.measure, line.ingredient);
        }
    }
    println!();
    println!("Instructions");
    for (i, step) in detail.steps().iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
    if let Some(source) = &r.source_url {
        println!();
        println!("Source: {}", source);
    }
    if let Some(video) = r.video_id() {
        println!("Video: https://www.youtube.com/embed/{}", video);
    }
}

async fn favorite(app: &App, id: &str) -> Result<()> {
    let identity = app.identity()?;
    let mut view = DetailView::new();
    view.load(&app.recipes, app.favorites.as_ref(), identity.as_ref(), id)
        .await;
    let name = match view.state() {
        DetailState::Ready(detail) => detail.recipe.name.clone(),
        DetailState::NotFound => {
            println!("Recipe not found");
            return Ok(());
        }
        DetailState::Failed(message) => {
            println!("{}", message);
            return Ok(());
        }
        DetailState::Loading => return Ok(()),
    };
    match view
        .toggle_favorite(app.favorites.as_ref(), identity.as_ref())
        .await
        .context("recipe not loaded")?
    {
        Ok(true) => println!("Saved \"{}\" to your favorites.", name),
        Ok(false) => println!("Removed \"{}\" from your favorites.", name),
        Err(notice) => println!("{}", notice),
    }
    Ok(())
}

async fn favorites(app: &App) -> Result<()> {
    let identity = app.identity()?;
    let mut view = FavoritesView::new();
    view.load(app.favorites.as_ref(), identity.as_ref()).await;
    match view.state() {
        FavoritesState::SignedOut => println!("Log in to see your favorites."),
        FavoritesState::Failed(message) => println!("{}", message),
        FavoritesState::Empty => {
            println!("{}", view.summary());
            println!("Start searching for recipes and favorite them to save them here.");
        }
        FavoritesState::Loaded(entries) => {
            println!("{}", view.summary());
            for fav in entries {
                println!(
                    "{:>6}  {}  (added {})",
                    fav.recipe_id,
                    fav.recipe_name,
                    fav.created_at.format("%Y-%m-%d")
                );
            }
        }
        FavoritesState::Loading => {}
    }
    Ok(())
}

async fn remove(app: &App, recipe_id: &str) -> Result<()> {
    let identity = app.identity()?;
    let mut view = FavoritesView::new();
    view.load(app.favorites.as_ref(), identity.as_ref()).await;
    if let FavoritesState::Failed(message) = view.state() {
        println!("{}", message);
        return Ok(());
    }
    match view
        .remove(app.favorites.as_ref(), identity.as_ref(), recipe_id)
        .await
    {
        Ok(()) => println!("Removed. {}", view.summary()),
        Err(notice) => println!("{}", notice),
    }
    Ok(())
}
