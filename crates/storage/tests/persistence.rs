use shared::domain::{MovieDraft, MovieId};
use storage::Storage;

fn database_url(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("movies.db");
    format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
}

#[tokio::test]
async fn movies_survive_reopening_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);

    let storage = Storage::new(&url).await.expect("open");
    let id = storage
        .insert_movie(&MovieDraft {
            title: "Stalker".into(),
            genre: "Drama".into(),
            year: 1979,
            rating: 10,
        })
        .await
        .expect("insert");
    storage.close().await;

    let reopened = Storage::new(&url).await.expect("reopen");
    let movies = reopened.list_movies().await.expect("list");
    let movie = movies
        .iter()
        .find(|movie| movie.id == id)
        .expect("movie persisted");
    assert_eq!(movie.title, "Stalker");
    assert_eq!(movie.rating, 10);
    reopened.close().await;
}

#[tokio::test]
async fn ids_keep_increasing_across_reopen_after_delete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);
    let draft = MovieDraft {
        title: "Solaris".into(),
        genre: "Sci-Fi".into(),
        year: 1972,
        rating: 9,
    };

    let storage = Storage::new(&url).await.expect("open");
    let first = storage.insert_movie(&draft).await.expect("insert");
    assert!(storage.delete_movie(first).await.expect("delete"));
    storage.close().await;

    let reopened = Storage::new(&url).await.expect("reopen");
    let second: MovieId = reopened.insert_movie(&draft).await.expect("insert");
    assert!(second.0 > first.0);
    reopened.close().await;
}
