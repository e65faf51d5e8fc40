//! Client-side ordering of the fetched movie set.

use std::cmp::Ordering;

use shared::domain::Movie;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Title,
    RatingAsc,
    RatingDesc,
    YearAsc,
    YearDesc,
    Genre,
    /// Any other key. Keeps the order the server returned.
    Unrecognized(String),
}

impl SortKey {
    pub const SUPPORTED: [SortKey; 6] = [
        SortKey::Title,
        SortKey::RatingDesc,
        SortKey::RatingAsc,
        SortKey::YearDesc,
        SortKey::YearAsc,
        SortKey::Genre,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "title" => Self::Title,
            "rating-asc" => Self::RatingAsc,
            "rating-desc" => Self::RatingDesc,
            "year-asc" => Self::YearAsc,
            "year-desc" => Self::YearDesc,
            "genre" => Self::Genre,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::RatingAsc => "rating-asc",
            Self::RatingDesc => "rating-desc",
            Self::YearAsc => "year-asc",
            Self::YearDesc => "year-desc",
            Self::Genre => "genre",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<&str> for SortKey {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns a sorted copy of `movies`. The sort is stable and the input is
/// never modified.
pub fn sort_movies(movies: &[Movie], key: &SortKey) -> Vec<Movie> {
    let mut sorted = movies.to_vec();
    match key {
        SortKey::Title => sorted.sort_by(|a, b| collate(&a.title, &b.title)),
        SortKey::RatingAsc => sorted.sort_by(|a, b| a.rating.cmp(&b.rating)),
        SortKey::RatingDesc => sorted.sort_by(|a, b| b.rating.cmp(&a.rating)),
        SortKey::YearAsc => sorted.sort_by(|a, b| a.year.cmp(&b.year)),
        SortKey::YearDesc => sorted.sort_by(|a, b| b.year.cmp(&a.year)),
        SortKey::Genre => sorted.sort_by(|a, b| collate(&a.genre, &b.genre)),
        SortKey::Unrecognized(_) => {}
    }
    sorted
}

/// Swedish-flavoured collation: case and most diacritics are ignored at the
/// first level, å ä ö sort after z. Remaining ties fall back to code points.
pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

const AFTER_Z: u32 = 'z' as u32;

fn collation_key(text: &str) -> Vec<u32> {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(primary_weight)
        .collect()
}

fn primary_weight(c: char) -> u32 {
    let base = match c {
        'å' => return AFTER_Z + 1,
        'ä' | 'æ' => return AFTER_Z + 2,
        'ö' | 'ø' => return AFTER_Z + 3,
        'à' | 'á' | 'â' | 'ã' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' => 'o',
        'ù' | 'ú' | 'û' => 'u',
        'ü' | 'ý' | 'ÿ' => 'y',
        other => other,
    };
    base as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::MovieId;

    fn movie(id: i64, title: &str, genre: &str, year: i64, rating: i64) -> Movie {
        Movie {
            id: MovieId(id),
            title: title.into(),
            genre: genre.into(),
            year,
            rating,
        }
    }

    fn catalog() -> Vec<Movie> {
        vec![
            movie(1, "Örnen", "Drama", 2004, 7),
            movie(2, "alien", "Sci-Fi", 1979, 9),
            movie(3, "Ängel", "Drama", 1999, 7),
            movie(4, "Zodiac", "Crime", 2007, 8),
            movie(5, "Åsa-Nisse", "Comedy", 1949, 3),
            movie(6, "Élite", "Action", 2018, 6),
        ]
    }

    fn titles(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.title.as_str()).collect()
    }

    fn ids(movies: &[Movie]) -> Vec<i64> {
        movies.iter().map(|m| m.id.0).collect()
    }

    #[test]
    fn title_sort_is_case_insensitive_and_puts_swedish_letters_last() {
        let sorted = sort_movies(&catalog(), &SortKey::Title);
        assert_eq!(
            titles(&sorted),
            vec!["alien", "Élite", "Zodiac", "Åsa-Nisse", "Ängel", "Örnen"]
        );
    }

    #[test]
    fn rating_sorts_are_stable_in_both_directions() {
        let asc = sort_movies(&catalog(), &SortKey::RatingAsc);
        assert_eq!(ids(&asc), vec![5, 6, 1, 3, 4, 2]);

        let desc = sort_movies(&catalog(), &SortKey::RatingDesc);
        assert_eq!(ids(&desc), vec![2, 4, 1, 3, 6, 5]);
    }

    #[test]
    fn year_sorts_order_numerically() {
        assert_eq!(
            ids(&sort_movies(&catalog(), &SortKey::YearAsc)),
            vec![5, 2, 3, 1, 4, 6]
        );
        assert_eq!(
            ids(&sort_movies(&catalog(), &SortKey::YearDesc)),
            vec![6, 4, 1, 3, 2, 5]
        );
    }

    #[test]
    fn genre_sort_keeps_input_order_for_equal_genres() {
        let sorted = sort_movies(&catalog(), &SortKey::Genre);
        assert_eq!(ids(&sorted), vec![6, 5, 4, 1, 3, 2]);
    }

    #[test]
    fn sorting_is_idempotent_for_every_supported_key() {
        let movies = catalog();
        for key in SortKey::SUPPORTED {
            let once = sort_movies(&movies, &key);
            let twice = sort_movies(&once, &key);
            assert_eq!(once, twice, "key {key}");
        }
    }

    #[test]
    fn unrecognized_key_returns_input_order_without_mutation() {
        let movies = catalog();
        let before = movies.clone();
        let key = SortKey::parse("director");
        assert_eq!(key, SortKey::Unrecognized("director".into()));
        assert_eq!(sort_movies(&movies, &key), before);
        assert_eq!(movies, before);
    }

    #[test]
    fn parse_round_trips_supported_keys() {
        for key in SortKey::SUPPORTED {
            assert_eq!(SortKey::parse(key.as_str()), key);
        }
    }
}
