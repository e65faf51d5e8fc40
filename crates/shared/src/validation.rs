//! Field rules shared by the catalog service and its clients.
//!
//! The service is authoritative; clients run the same rules before sending a
//! request so the user sees problems without a round trip.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{MovieDraft, MAX_RATING, MIN_RATING},
    protocol::MovieInput,
};

/// Year of the first public film screening.
pub const FIRST_FILM_YEAR: i64 = 1895;
pub const DEFAULT_MAX_RELEASE_YEAR: i64 = 2030;

/// Inclusive range of accepted release years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub min: i64,
    pub max: i64,
}

impl Default for YearBounds {
    fn default() -> Self {
        Self {
            min: FIRST_FILM_YEAR,
            max: DEFAULT_MAX_RELEASE_YEAR,
        }
    }
}

impl YearBounds {
    pub fn with_max(max: i64) -> Self {
        Self {
            min: FIRST_FILM_YEAR,
            max: max.max(FIRST_FILM_YEAR),
        }
    }

    pub fn contains(&self, year: i64) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

/// Checks every field of `input` and returns either the normalized draft or
/// one message per violated field, in field order.
pub fn validate_movie(input: &MovieInput, bounds: YearBounds) -> Result<MovieDraft, Vec<String>> {
    let mut errors = Vec::new();

    let title = required_text(&input.title);
    if title.is_none() {
        errors.push("title is required".to_string());
    }

    let genre = required_text(&input.genre);
    if genre.is_none() {
        errors.push("genre is required".to_string());
    }

    let year = coerce_integer(&input.year).filter(|year| bounds.contains(*year));
    if year.is_none() {
        errors.push(format!(
            "year must be an integer between {} and {}",
            bounds.min, bounds.max
        ));
    }

    let rating =
        coerce_integer(&input.rating).filter(|rating| (MIN_RATING..=MAX_RATING).contains(rating));
    if rating.is_none() {
        errors.push(format!(
            "rating must be an integer between {MIN_RATING} and {MAX_RATING}"
        ));
    }

    match (title, genre, year, rating) {
        (Some(title), Some(genre), Some(year), Some(rating)) => Ok(MovieDraft {
            title,
            genre,
            year,
            rating,
        }),
        _ => Err(errors),
    }
}

fn required_text(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Accepts JSON integers, integral floats and numeric strings.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(integral_f64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral_f64))
        }
        _ => None,
    }
}

fn integral_f64(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(title: Value, genre: Value, year: Value, rating: Value) -> MovieInput {
        MovieInput {
            title,
            genre,
            year,
            rating,
        }
    }

    #[test]
    fn accepts_and_trims_valid_input() {
        let draft = validate_movie(
            &input(json!("  Alien "), json!("Sci-Fi\t"), json!(1979), json!(9)),
            YearBounds::default(),
        )
        .expect("valid");
        assert_eq!(
            draft,
            MovieDraft {
                title: "Alien".into(),
                genre: "Sci-Fi".into(),
                year: 1979,
                rating: 9,
            }
        );
    }

    #[test]
    fn reports_every_violation_in_field_order() {
        let errors = validate_movie(
            &input(json!("   "), Value::Null, json!(1700), json!(11)),
            YearBounds::default(),
        )
        .expect_err("invalid");
        assert_eq!(
            errors,
            vec![
                "title is required".to_string(),
                "genre is required".to_string(),
                "year must be an integer between 1895 and 2030".to_string(),
                "rating must be an integer between 1 and 10".to_string(),
            ]
        );
    }

    #[test]
    fn empty_title_yields_single_title_detail() {
        let errors = validate_movie(
            &input(json!(""), json!("Drama"), json!(1999), json!(7)),
            YearBounds::default(),
        )
        .expect_err("invalid");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("title"));
    }

    #[test]
    fn coerces_numeric_strings_and_integral_floats() {
        let draft = validate_movie(
            &input(json!("Heat"), json!("Crime"), json!(" 1995 "), json!(8.0)),
            YearBounds::default(),
        )
        .expect("valid");
        assert_eq!(draft.year, 1995);
        assert_eq!(draft.rating, 8);
    }

    #[test]
    fn rejects_fractional_and_non_numeric_values() {
        for bad in [json!(7.5), json!("seven"), json!(true), json!([7]), json!(""), Value::Null] {
            let errors = validate_movie(
                &input(json!("Heat"), json!("Crime"), json!(1995), bad.clone()),
                YearBounds::default(),
            )
            .expect_err("invalid rating");
            assert_eq!(errors.len(), 1, "value {bad}");
            assert!(errors[0].starts_with("rating"));
        }
    }

    #[test]
    fn non_string_title_is_a_violation() {
        let errors = validate_movie(
            &input(json!(42), json!("Drama"), json!(1999), json!(7)),
            YearBounds::default(),
        )
        .expect_err("invalid");
        assert_eq!(errors, vec!["title is required".to_string()]);
    }

    #[test]
    fn year_bounds_are_inclusive_and_configurable() {
        let bounds = YearBounds::with_max(2026);
        assert!(bounds.contains(1895));
        assert!(bounds.contains(2026));
        assert!(!bounds.contains(1894));
        assert!(!bounds.contains(2027));

        let errors = validate_movie(
            &input(json!("Future"), json!("Drama"), json!(2027), json!(5)),
            bounds,
        )
        .expect_err("too late");
        assert_eq!(errors, vec!["year must be an integer between 1895 and 2026".to_string()]);
    }

    #[test]
    fn rating_edges_are_accepted() {
        for rating in [1, 10] {
            validate_movie(
                &input(json!("Edge"), json!("Drama"), json!(2000), json!(rating)),
                YearBounds::default(),
            )
            .expect("edge rating");
        }
    }
}
