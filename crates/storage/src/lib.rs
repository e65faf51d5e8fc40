use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{Movie, MovieDraft, MovieId};

/// Handle to the movie table.
///
/// Cloning is cheap and shares the underlying pool. Call [`Storage::close`]
/// once at shutdown so pending writes are flushed before the process exits.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);

        // An in-memory database lives only as long as its connections.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;

        let storage = Self { pool };
        storage.ensure_movies_table().await?;
        Ok(storage)
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn ensure_movies_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS movies (
                id     INTEGER PRIMARY KEY AUTOINCREMENT,
                title  TEXT NOT NULL,
                genre  TEXT NOT NULL,
                year   INTEGER NOT NULL,
                rating INTEGER NOT NULL CHECK(rating >= 1 AND rating <= 10)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure movies table exists")?;
        Ok(())
    }

    /// All movies in the order SQLite yields them.
    pub async fn list_movies(&self) -> Result<Vec<Movie>> {
        let rows = sqlx::query("SELECT id, title, genre, year, rating FROM movies")
            .fetch_all(&self.pool)
            .await
            .context("failed to list movies")?;
        rows.iter().map(movie_from_row).collect()
    }

    pub async fn insert_movie(&self, draft: &MovieDraft) -> Result<MovieId> {
        let rec = sqlx::query(
            "INSERT INTO movies (title, genre, year, rating) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&draft.title)
        .bind(&draft.genre)
        .bind(draft.year)
        .bind(draft.rating)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert movie")?;
        let movie_id = MovieId(rec.try_get::<i64, _>(0)?);
        debug!(%movie_id, "movie row inserted");
        Ok(movie_id)
    }

    /// Overwrites all fields of an existing movie. Returns `false` when no
    /// row has the given id.
    pub async fn update_movie(&self, movie_id: MovieId, draft: &MovieDraft) -> Result<bool> {
        let result =
            sqlx::query("UPDATE movies SET title = ?, genre = ?, year = ?, rating = ? WHERE id = ?")
                .bind(&draft.title)
                .bind(&draft.genre)
                .bind(draft.year)
                .bind(draft.rating)
                .bind(movie_id.0)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to update movie {movie_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` when no row has the given id.
    pub async fn delete_movie(&self, movie_id: MovieId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(movie_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete movie {movie_id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn movie_from_row(row: &SqliteRow) -> Result<Movie> {
    Ok(Movie {
        id: MovieId(row.try_get("id")?),
        title: row.try_get("title")?,
        genre: row.try_get("genre")?,
        year: row.try_get("year")?,
        rating: row.try_get("rating")?,
    })
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_in_memory(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
