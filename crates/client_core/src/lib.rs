use serde_json::Value;
use shared::{
    domain::{Movie, MovieId},
    protocol::MovieInput,
    validation::{validate_movie, YearBounds},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod sort;
mod transport;
pub mod view;

pub use sort::{sort_movies, SortKey};
pub use transport::{CatalogApi, HttpCatalogApi};
pub use view::{render_html, render_text, ListView};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        details: Vec<String>,
    },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server did not send JSON data; is the catalog server running?")]
    NotJson,
    #[error("invalid server url {0}")]
    InvalidServerUrl(String),
    #[error("{}", .0.join(", "))]
    Invalid(Vec<String>),
    #[error("{0} is still in progress")]
    Busy(Operation),
    #[error("no delete is waiting for confirmation")]
    NothingToConfirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Refresh,
    Submit,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Refresh => "refresh",
            Self::Submit => "save",
            Self::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message for the user that stays visible until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Form fields exactly as typed. Numbers stay text until validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieForm {
    pub title: String,
    pub genre: String,
    pub year: String,
    pub rating: String,
}

impl MovieForm {
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            genre: movie.genre.clone(),
            year: movie.year.to_string(),
            rating: movie.rating.to_string(),
        }
    }

    pub fn to_input(&self) -> MovieInput {
        MovieInput {
            title: Value::from(self.title.as_str()),
            genre: Value::from(self.genre.as_str()),
            year: Value::from(self.year.as_str()),
            rating: Value::from(self.rating.as_str()),
        }
    }
}

#[derive(Default, Debug, Clone)]
pub struct ClientState {
    /// Movie the form is editing; `None` means the form creates a new one.
    pub editing: Option<MovieId>,
    pub form: MovieForm,
    pub sort_key: SortKey,
    /// Last fetched set, in server order.
    pub movies: Vec<Movie>,
    pub view: ListView,
    pub pending_delete: Option<MovieId>,
    pub in_flight: Option<Operation>,
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    ViewChanged(ListView),
    EditStateChanged {
        editing: Option<MovieId>,
        form: MovieForm,
    },
    Notified(Notification),
}

#[derive(Debug, Clone)]
pub enum ClientCommand {
    Refresh,
    SetSort(SortKey),
    UpdateForm(MovieForm),
    Submit,
    BeginEdit(Movie),
    CancelEdit,
    RequestDelete(MovieId),
    ConfirmDelete,
    CancelDelete,
    DismissNotification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(MovieId),
    Updated(MovieId),
}

pub struct CatalogClient<A: CatalogApi> {
    api: A,
    year_bounds: YearBounds,
    inner: Mutex<ClientState>,
    events: broadcast::Sender<ClientEvent>,
}

impl<A: CatalogApi> CatalogClient<A> {
    pub fn new(api: A, year_bounds: YearBounds) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            api,
            year_bounds,
            inner: Mutex::new(ClientState::default()),
            events,
        }
    }

    pub fn year_bounds(&self) -> YearBounds {
        self.year_bounds
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ClientState {
        self.inner.lock().await.clone()
    }

    pub async fn handle(&self, command: ClientCommand) -> Result<(), CatalogError> {
        match command {
            ClientCommand::Refresh => self.refresh().await,
            ClientCommand::SetSort(key) => {
                self.set_sort_key(key).await;
                Ok(())
            }
            ClientCommand::UpdateForm(form) => self.update_form(form).await,
            ClientCommand::Submit => self.submit().await.map(|_| ()),
            ClientCommand::BeginEdit(movie) => self.begin_edit(&movie).await,
            ClientCommand::CancelEdit => self.cancel_edit().await,
            ClientCommand::RequestDelete(movie_id) => self.request_delete(movie_id).await,
            ClientCommand::ConfirmDelete => self.confirm_delete().await.map(|_| ()),
            ClientCommand::CancelDelete => {
                self.cancel_delete().await;
                Ok(())
            }
            ClientCommand::DismissNotification => {
                self.dismiss_notification().await;
                Ok(())
            }
        }
    }

    /// Fetches the full movie set and re-renders the list. Fetch failures are
    /// rendered as an error panel; only a conflicting in-flight operation is
    /// reported as an error.
    pub async fn refresh(&self) -> Result<(), CatalogError> {
        self.begin(Operation::Refresh).await?;
        self.set_view(ListView::Loading).await;

        let result = self.api.list_movies().await;

        let view = {
            let mut guard = self.inner.lock().await;
            guard.in_flight = None;
            let view = match result {
                Ok(movies) => {
                    info!(count = movies.len(), "movies fetched");
                    guard.movies = movies;
                    render_state(&guard.movies, &guard.sort_key)
                }
                Err(err) => {
                    warn!(error = %err, "failed to fetch movies");
                    ListView::Error {
                        message: err.to_string(),
                    }
                }
            };
            guard.view = view.clone();
            view
        };
        self.emit(ClientEvent::ViewChanged(view));
        Ok(())
    }

    /// Re-orders the cached set without contacting the server.
    pub async fn set_sort_key(&self, key: SortKey) {
        let view = {
            let mut guard = self.inner.lock().await;
            guard.sort_key = key;
            match guard.view {
                ListView::Loaded(_) | ListView::Empty => {
                    let view = render_state(&guard.movies, &guard.sort_key);
                    guard.view = view.clone();
                    Some(view)
                }
                ListView::Loading | ListView::Error { .. } => None,
            }
        };
        if let Some(view) = view {
            self.emit(ClientEvent::ViewChanged(view));
        }
    }

    pub async fn update_form(&self, form: MovieForm) -> Result<(), CatalogError> {
        let editing = {
            let mut guard = self.inner.lock().await;
            ensure_not_submitting(&guard)?;
            guard.form = form.clone();
            guard.editing
        };
        self.emit(ClientEvent::EditStateChanged { editing, form });
        Ok(())
    }

    /// Validates the form locally, then creates or updates depending on the
    /// edit state. Nothing local changes unless the server accepts the write.
    pub async fn submit(&self) -> Result<SubmitOutcome, CatalogError> {
        self.begin(Operation::Submit).await?;
        let (editing, form) = {
            let guard = self.inner.lock().await;
            (guard.editing, guard.form.clone())
        };

        let draft = match validate_movie(&form.to_input(), self.year_bounds) {
            Ok(draft) => draft,
            Err(details) => {
                self.finish().await;
                let err = CatalogError::Invalid(details);
                self.notify(NotificationLevel::Warning, err.to_string()).await;
                return Err(err);
            }
        };

        let result = match editing {
            Some(movie_id) => self
                .api
                .update_movie(movie_id, &draft)
                .await
                .map(|_| SubmitOutcome::Updated(movie_id)),
            None => self
                .api
                .create_movie(&draft)
                .await
                .map(|created| SubmitOutcome::Created(created.id)),
        };
        self.finish().await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, editing = ?editing.map(|id| id.0), "save rejected");
                self.notify(NotificationLevel::Error, err.to_string()).await;
                return Err(err);
            }
        };

        let message = match outcome {
            SubmitOutcome::Created(movie_id) => {
                info!(%movie_id, "movie added");
                "Movie added"
            }
            SubmitOutcome::Updated(movie_id) => {
                info!(%movie_id, "movie updated");
                "Movie updated"
            }
        };
        self.reset_edit_state().await;
        self.notify(NotificationLevel::Success, message).await;
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "skipped refresh after save");
        }
        Ok(outcome)
    }

    pub async fn begin_edit(&self, movie: &Movie) -> Result<(), CatalogError> {
        let form = MovieForm::from_movie(movie);
        {
            let mut guard = self.inner.lock().await;
            ensure_not_submitting(&guard)?;
            guard.editing = Some(movie.id);
            guard.form = form.clone();
        }
        self.emit(ClientEvent::EditStateChanged {
            editing: Some(movie.id),
            form,
        });
        Ok(())
    }

    pub async fn cancel_edit(&self) -> Result<(), CatalogError> {
        {
            let guard = self.inner.lock().await;
            ensure_not_submitting(&guard)?;
        }
        self.reset_edit_state().await;
        Ok(())
    }

    /// First half of a delete: remembers the target until the user confirms.
    pub async fn request_delete(&self, movie_id: MovieId) -> Result<(), CatalogError> {
        let mut guard = self.inner.lock().await;
        if guard.in_flight == Some(Operation::Delete) {
            return Err(CatalogError::Busy(Operation::Delete));
        }
        guard.pending_delete = Some(movie_id);
        Ok(())
    }

    pub async fn confirm_delete(&self) -> Result<MovieId, CatalogError> {
        let movie_id = {
            let mut guard = self.inner.lock().await;
            let Some(movie_id) = guard.pending_delete else {
                return Err(CatalogError::NothingToConfirm);
            };
            if let Some(active) = guard.in_flight {
                return Err(CatalogError::Busy(active));
            }
            guard.pending_delete = None;
            guard.in_flight = Some(Operation::Delete);
            movie_id
        };

        let result = self.api.delete_movie(movie_id).await;
        self.finish().await;

        if let Err(err) = result {
            warn!(%movie_id, error = %err, "delete rejected");
            self.notify(NotificationLevel::Error, err.to_string()).await;
            return Err(err);
        }

        info!(%movie_id, "movie deleted");
        self.notify(NotificationLevel::Success, "Movie deleted").await;
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "skipped refresh after delete");
        }
        Ok(movie_id)
    }

    pub async fn cancel_delete(&self) {
        self.inner.lock().await.pending_delete = None;
    }

    pub async fn dismiss_notification(&self) {
        self.inner.lock().await.notification = None;
    }

    async fn begin(&self, operation: Operation) -> Result<(), CatalogError> {
        let mut guard = self.inner.lock().await;
        if let Some(active) = guard.in_flight {
            return Err(CatalogError::Busy(active));
        }
        guard.in_flight = Some(operation);
        Ok(())
    }

    async fn finish(&self) {
        self.inner.lock().await.in_flight = None;
    }

    async fn set_view(&self, view: ListView) {
        self.inner.lock().await.view = view.clone();
        self.emit(ClientEvent::ViewChanged(view));
    }

    async fn reset_edit_state(&self) {
        {
            let mut guard = self.inner.lock().await;
            guard.editing = None;
            guard.form = MovieForm::default();
        }
        self.emit(ClientEvent::EditStateChanged {
            editing: None,
            form: MovieForm::default(),
        });
    }

    async fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        let notification = Notification {
            level,
            message: message.into(),
        };
        self.inner.lock().await.notification = Some(notification.clone());
        self.emit(ClientEvent::Notified(notification));
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

fn render_state(movies: &[Movie], sort_key: &SortKey) -> ListView {
    if movies.is_empty() {
        ListView::Empty
    } else {
        ListView::Loaded(sort_movies(movies, sort_key))
    }
}

fn ensure_not_submitting(state: &ClientState) -> Result<(), CatalogError> {
    if state.in_flight == Some(Operation::Submit) {
        return Err(CatalogError::Busy(Operation::Submit));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod transport_tests;
