use shared::{
    domain::{Movie, MovieDraft, MovieId},
    error::ApiError,
    protocol::{CreateMovieResponse, MessageResponse, MovieInput},
    validation::{validate_movie, YearBounds},
};
use storage::Storage;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub year_bounds: YearBounds,
}

pub async fn list_movies(ctx: &ApiContext) -> Result<Vec<Movie>, ApiError> {
    let movies = ctx
        .storage
        .list_movies()
        .await
        .map_err(|err| internal("list_movies", err, "Could not fetch movies"))?;
    info!(count = movies.len(), "listed movies");
    Ok(movies)
}

pub async fn create_movie(
    ctx: &ApiContext,
    input: &MovieInput,
) -> Result<CreateMovieResponse, ApiError> {
    let draft = validated(ctx, "create_movie", None, input)?;
    let movie_id = ctx
        .storage
        .insert_movie(&draft)
        .await
        .map_err(|err| internal("create_movie", err, "Could not create movie"))?;
    info!(%movie_id, title = %draft.title, "movie created");
    Ok(CreateMovieResponse {
        id: movie_id,
        message: "Movie created".into(),
    })
}

/// Replaces all fields of an existing movie. Partial updates are not
/// supported; the input is validated exactly like a create.
pub async fn update_movie(
    ctx: &ApiContext,
    movie_id: MovieId,
    input: &MovieInput,
) -> Result<MessageResponse, ApiError> {
    let draft = validated(ctx, "update_movie", Some(movie_id), input)?;
    let updated = ctx
        .storage
        .update_movie(movie_id, &draft)
        .await
        .map_err(|err| internal("update_movie", err, "Could not update movie"))?;
    if !updated {
        warn!(%movie_id, "update_movie: movie not found");
        return Err(movie_not_found());
    }
    info!(%movie_id, "movie updated");
    Ok(MessageResponse::new("Movie updated"))
}

pub async fn delete_movie(ctx: &ApiContext, movie_id: MovieId) -> Result<MessageResponse, ApiError> {
    let deleted = ctx
        .storage
        .delete_movie(movie_id)
        .await
        .map_err(|err| internal("delete_movie", err, "Could not delete movie"))?;
    if !deleted {
        warn!(%movie_id, "delete_movie: movie not found");
        return Err(movie_not_found());
    }
    info!(%movie_id, "movie deleted");
    Ok(MessageResponse::new("Movie deleted"))
}

pub fn movie_not_found() -> ApiError {
    ApiError::not_found("Movie not found")
}

fn validated(
    ctx: &ApiContext,
    operation: &'static str,
    movie_id: Option<MovieId>,
    input: &MovieInput,
) -> Result<MovieDraft, ApiError> {
    validate_movie(input, ctx.year_bounds).map_err(|details| {
        warn!(operation, movie_id = ?movie_id.map(|id| id.0), ?details, "validation failed");
        ApiError::validation(details)
    })
}

fn internal(operation: &'static str, err: anyhow::Error, message: &str) -> ApiError {
    error!(operation, error = %format!("{err:#}"), "storage failure");
    ApiError::internal(message)
}
