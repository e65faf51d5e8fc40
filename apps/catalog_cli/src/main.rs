use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    render_text, CatalogApi, CatalogClient, HttpCatalogApi, ListView, MovieForm,
    NotificationLevel, SortKey,
};
use dialoguer::{Confirm, Input, Select};
use shared::{domain::MovieId, validation::YearBounds};
use tracing::debug;
use tracing_subscriber::EnvFilter;

type Client = CatalogClient<HttpCatalogApi>;

#[derive(Parser, Debug)]
#[command(about = "Browse and edit the movie catalog")]
struct Args {
    #[arg(long, default_value = "http://localhost:3000")]
    server_url: String,
    /// Latest release year accepted by the form.
    #[arg(long)]
    max_year: Option<i64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        /// title, rating-asc, rating-desc, year-asc, year-desc or genre
        #[arg(long, default_value = "title")]
        sort: String,
    },
    Add,
    Edit {
        id: i64,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    Shell,
}

#[derive(Debug, Clone, Copy)]
enum ShellAction {
    List,
    Add,
    Edit,
    Delete,
    Sort,
    Quit,
}

impl ShellAction {
    const ALL: [ShellAction; 6] = [
        ShellAction::List,
        ShellAction::Add,
        ShellAction::Edit,
        ShellAction::Delete,
        ShellAction::Sort,
        ShellAction::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::List => "Refresh list",
            Self::Add => "Add movie",
            Self::Edit => "Edit movie",
            Self::Delete => "Delete movie",
            Self::Sort => "Change sort order",
            Self::Quit => "Quit",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let year_bounds = args
        .max_year
        .map(YearBounds::with_max)
        .unwrap_or_default();
    debug!(server_url = %args.server_url, ?year_bounds, "starting catalog cli");
    let client = CatalogClient::new(HttpCatalogApi::new(&args.server_url)?, year_bounds);

    match args.command {
        Command::List { sort } => {
            client.set_sort_key(SortKey::parse(&sort)).await;
            refresh_and_show(&client).await?;
            if let ListView::Error { .. } = client.snapshot().await.view {
                bail!("could not load movies from {}", args.server_url);
            }
        }
        Command::Add => add(&client).await?,
        Command::Edit { id } => edit(&client, MovieId(id)).await?,
        Command::Delete { id, yes } => delete(&client, MovieId(id), yes).await?,
        Command::Shell => shell(&client).await?,
    }
    Ok(())
}

async fn refresh_and_show(client: &Client) -> Result<()> {
    client.refresh().await?;
    show(client).await;
    Ok(())
}

async fn show(client: &Client) {
    print!("{}", render_text(&client.snapshot().await.view));
}

async fn add(client: &Client) -> Result<()> {
    let form = prompt_form(&MovieForm::default(), client.year_bounds())?;
    save_new(client, form).await
}

/// Saves `form` as a new movie. An edit left over from an earlier failed
/// save would otherwise turn this into an update of that movie.
async fn save_new<A: CatalogApi>(client: &CatalogClient<A>, form: MovieForm) -> Result<()> {
    client.cancel_edit().await?;
    save(client, form).await
}

async fn edit(client: &Client, movie_id: MovieId) -> Result<()> {
    client.refresh().await?;
    let state = client.snapshot().await;
    if let ListView::Error { message } = &state.view {
        bail!("could not load movies: {message}");
    }
    let movie = state
        .movies
        .iter()
        .find(|movie| movie.id == movie_id)
        .cloned()
        .with_context(|| format!("movie {movie_id} not found"))?;

    client.begin_edit(&movie).await?;
    let form = match prompt_form(&MovieForm::from_movie(&movie), client.year_bounds()) {
        Ok(form) => form,
        Err(err) => {
            client.cancel_edit().await?;
            return Err(err);
        }
    };
    save(client, form).await
}

async fn save<A: CatalogApi>(client: &CatalogClient<A>, form: MovieForm) -> Result<()> {
    client.update_form(form).await?;
    let result = client.submit().await;
    report(client).await;
    result?;
    Ok(())
}

async fn delete(client: &Client, movie_id: MovieId, skip_prompt: bool) -> Result<()> {
    client.request_delete(movie_id).await?;
    let confirmed = skip_prompt
        || Confirm::new()
            .with_prompt(format!("Are you sure you want to delete movie {movie_id}?"))
            .default(false)
            .interact()
            .context("failed to read confirmation")?;
    if !confirmed {
        client.cancel_delete().await;
        println!("Delete cancelled");
        return Ok(());
    }

    let result = client.confirm_delete().await;
    report(client).await;
    result?;
    Ok(())
}

/// Prints a success notification once. Failures reach the user through the
/// returned error instead.
async fn report<A: CatalogApi>(client: &CatalogClient<A>) {
    let notification = client.snapshot().await.notification;
    client.dismiss_notification().await;
    if let Some(notification) = notification {
        if matches!(
            notification.level,
            NotificationLevel::Success | NotificationLevel::Info
        ) {
            println!("{}", notification.message);
        }
    }
}

async fn shell(client: &Client) -> Result<()> {
    refresh_and_show(client).await?;
    let labels: Vec<&str> = ShellAction::ALL.iter().map(|a| a.label()).collect();

    loop {
        let choice = Select::new()
            .with_prompt("What next?")
            .items(&labels)
            .default(0)
            .interact_opt()
            .context("failed to read action")?;
        let Some(action) = choice.map(|index| ShellAction::ALL[index]) else {
            break;
        };

        let result = match action {
            ShellAction::List => refresh_and_show(client).await,
            ShellAction::Add => add(client).await,
            ShellAction::Edit => match prompt_id("Movie id to edit") {
                Ok(movie_id) => edit(client, movie_id).await,
                Err(err) => Err(err),
            },
            ShellAction::Delete => match prompt_id("Movie id to delete") {
                Ok(movie_id) => delete(client, movie_id, false).await,
                Err(err) => Err(err),
            },
            ShellAction::Sort => match prompt_sort_key() {
                Ok(key) => {
                    client.set_sort_key(key).await;
                    Ok(())
                }
                Err(err) => Err(err),
            },
            ShellAction::Quit => break,
        };

        match result {
            Ok(()) => {
                if !matches!(action, ShellAction::List) {
                    show(client).await;
                }
            }
            Err(err) => eprintln!("error: {err:#}"),
        }
    }
    Ok(())
}

fn prompt_form(initial: &MovieForm, year_bounds: YearBounds) -> Result<MovieForm> {
    Ok(MovieForm {
        title: prompt_field("Title", &initial.title)?,
        genre: prompt_field("Genre", &initial.genre)?,
        year: prompt_field(
            &format!("Year ({}-{})", year_bounds.min, year_bounds.max),
            &initial.year,
        )?,
        rating: prompt_field("Rating (1-10)", &initial.rating)?,
    })
}

fn prompt_field(prompt: &str, initial: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()
        .with_context(|| format!("failed to read {prompt}"))
}

fn prompt_id(prompt: &str) -> Result<MovieId> {
    let id = Input::<i64>::new()
        .with_prompt(prompt)
        .interact_text()
        .context("failed to read movie id")?;
    Ok(MovieId(id))
}

fn prompt_sort_key() -> Result<SortKey> {
    let keys = SortKey::SUPPORTED;
    let labels: Vec<&str> = keys.iter().map(SortKey::as_str).collect();
    let index = Select::new()
        .with_prompt("Sort by")
        .items(&labels)
        .default(0)
        .interact()
        .context("failed to read sort order")?;
    Ok(keys[index].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use client_core::CatalogError;
    use shared::{
        domain::{Movie, MovieDraft},
        protocol::{CreateMovieResponse, MessageResponse},
    };

    #[test]
    fn defaults_point_at_local_server() {
        let args = Args::try_parse_from(["catalog_cli", "list"]).expect("parse");
        assert_eq!(args.server_url, "http://localhost:3000");
        assert_eq!(args.max_year, None);
        assert!(matches!(args.command, Command::List { sort } if sort == "title"));
    }

    #[test]
    fn delete_accepts_yes_flag() {
        let args = Args::try_parse_from([
            "catalog_cli",
            "--server-url",
            "http://catalog:8080",
            "--max-year",
            "2100",
            "delete",
            "4",
            "--yes",
        ])
        .expect("parse");
        assert_eq!(args.max_year, Some(2100));
        assert!(matches!(args.command, Command::Delete { id: 4, yes: true }));
    }

    #[derive(Default)]
    struct InMemoryCatalog {
        movies: tokio::sync::Mutex<Vec<Movie>>,
    }

    #[async_trait]
    impl CatalogApi for InMemoryCatalog {
        async fn list_movies(&self) -> Result<Vec<Movie>, CatalogError> {
            Ok(self.movies.lock().await.clone())
        }

        async fn create_movie(
            &self,
            draft: &MovieDraft,
        ) -> Result<CreateMovieResponse, CatalogError> {
            let mut movies = self.movies.lock().await;
            let id = MovieId(movies.iter().map(|m| m.id.0).max().unwrap_or(0) + 1);
            movies.push(Movie::from_draft(id, draft.clone()));
            Ok(CreateMovieResponse {
                id,
                message: "Movie created".into(),
            })
        }

        async fn update_movie(
            &self,
            movie_id: MovieId,
            draft: &MovieDraft,
        ) -> Result<MessageResponse, CatalogError> {
            let mut movies = self.movies.lock().await;
            let movie = movies
                .iter_mut()
                .find(|m| m.id == movie_id)
                .expect("known movie");
            *movie = Movie::from_draft(movie_id, draft.clone());
            Ok(MessageResponse::new("Movie updated"))
        }

        async fn delete_movie(&self, movie_id: MovieId) -> Result<MessageResponse, CatalogError> {
            self.movies.lock().await.retain(|m| m.id != movie_id);
            Ok(MessageResponse::new("Movie deleted"))
        }
    }

    fn form(title: &str) -> MovieForm {
        MovieForm {
            title: title.into(),
            genre: "Crime".into(),
            year: "2007".into(),
            rating: "8".into(),
        }
    }

    #[tokio::test]
    async fn adding_after_a_failed_edit_creates_a_new_movie() {
        let client = CatalogClient::new(InMemoryCatalog::default(), YearBounds::default());
        save_new(&client, form("Zodiac")).await.expect("create");
        let zodiac = client.snapshot().await.movies[0].clone();

        client.begin_edit(&zodiac).await.expect("edit");
        save(&client, form("")).await.expect_err("empty title");
        assert_eq!(client.snapshot().await.editing, Some(zodiac.id));

        save_new(&client, form("Brand New")).await.expect("create");

        let state = client.snapshot().await;
        assert_eq!(state.editing, None);
        let mut titles: Vec<&str> = state.movies.iter().map(|m| m.title.as_str()).collect();
        titles.sort_unstable();
        assert_eq!(titles, vec!["Brand New", "Zodiac"]);
    }

    #[test]
    fn shell_actions_have_distinct_labels() {
        let mut labels: Vec<&str> = ShellAction::ALL.iter().map(|a| a.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), ShellAction::ALL.len());
    }
}
