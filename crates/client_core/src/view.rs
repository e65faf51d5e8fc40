//! List view model and its renderings.
//!
//! Every piece of text that originates from user input or from the server is
//! escaped before it is placed into markup.

use std::fmt::Write as _;

use shared::domain::Movie;

const RETRY_HINT: &str = "Check that the catalog server is running, then refresh.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListView {
    #[default]
    Loading,
    Empty,
    Error {
        message: String,
    },
    /// Movies in display order.
    Loaded(Vec<Movie>),
}

pub fn rating_class(rating: i64) -> &'static str {
    if rating >= 8 {
        "rating-high"
    } else if rating >= 5 {
        "rating-medium"
    } else {
        "rating-low"
    }
}

fn rating_badge_class(rating: i64) -> &'static str {
    if rating >= 8 {
        "bg-success"
    } else if rating >= 5 {
        "bg-warning text-dark"
    } else {
        "bg-danger"
    }
}

/// Escapes text for use both as element content and inside quoted
/// attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn render_html(view: &ListView) -> String {
    match view {
        ListView::Loading => concat!(
            r#"<div class="col-12 text-center">"#,
            r#"<div class="spinner-border text-primary" role="status">"#,
            r#"<span class="visually-hidden">Loading...</span></div></div>"#
        )
        .to_string(),
        ListView::Empty => concat!(
            r#"<div class="col-12"><div class="empty-state">"#,
            r#"<h5>No movies yet</h5>"#,
            r#"<p class="text-muted">Add your first movie with the form above!</p>"#,
            r#"</div></div>"#
        )
        .to_string(),
        ListView::Error { message } => format!(
            concat!(
                r#"<div class="col-12"><div class="alert alert-danger">"#,
                r#"<h5>Could not load movies</h5><p>{}</p><hr>"#,
                r#"<p class="mb-0">{}</p></div></div>"#
            ),
            escape_html(message),
            RETRY_HINT
        ),
        ListView::Loaded(movies) => {
            let mut html = String::new();
            for movie in movies {
                render_card(&mut html, movie);
            }
            html
        }
    }
}

fn render_card(out: &mut String, movie: &Movie) {
    let title = escape_html(&movie.title);
    let genre = escape_html(&movie.genre);
    // Writing into a String cannot fail.
    let _ = write!(
        out,
        concat!(
            r#"<div class="col-md-6 col-lg-4"><div class="movie-card {rating_class}">"#,
            r#"<h5>{title}</h5><div class="mb-3">"#,
            r#"<span class="badge bg-secondary">{genre}</span>"#,
            r#"<span class="badge bg-dark">{year}</span>"#,
            r#"<span class="badge {badge_class}">{rating}/10</span></div>"#,
            r#"<div class="d-grid gap-2 d-md-flex">"#,
            r#"<button class="btn btn-warning btn-sm flex-fill edit-btn" data-id="{id}" "#,
            r#"data-title="{title}" data-genre="{genre}" data-year="{year}" data-rating="{rating}">Edit</button>"#,
            r#"<button class="btn btn-danger btn-sm flex-fill delete-btn" data-id="{id}">Delete</button>"#,
            r#"</div></div></div>"#
        ),
        rating_class = rating_class(movie.rating),
        badge_class = rating_badge_class(movie.rating),
        title = title,
        genre = genre,
        year = movie.year,
        rating = movie.rating,
        id = movie.id,
    );
}

/// Plain rendering for terminals. Control characters are dropped so stored
/// text cannot move the cursor or recolour the screen.
pub fn render_text(view: &ListView) -> String {
    match view {
        ListView::Loading => "Loading...\n".to_string(),
        ListView::Empty => "No movies yet. Add your first movie!\n".to_string(),
        ListView::Error { message } => format!(
            "Could not load movies: {}\n{RETRY_HINT}\n",
            strip_control(message)
        ),
        ListView::Loaded(movies) => {
            let mut text = String::new();
            for movie in movies {
                let _ = writeln!(
                    text,
                    "#{:<4} {} [{}] {} {}/10",
                    movie.id,
                    strip_control(&movie.title),
                    strip_control(&movie.genre),
                    movie.year,
                    movie.rating
                );
            }
            text
        }
    }
}

fn strip_control(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}
