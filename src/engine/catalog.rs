//! Catalog lookup: the movie source the engine consults.
//!
//! The engine only needs `find_by_id` and `search`. `InMemoryCatalog` is the
//! reference implementation used by the binaries, the arena and tests. It
//! normalizes loose genre encodings once at ingestion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::engine::models::{Genre, GenreSet, Movie, MovieId, Person, PersonId};
use crate::game::connectivity::are_connected;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate movie id {0} in catalog")]
    DuplicateMovie(MovieId),
}

/// Source of movie records.
pub trait CatalogLookup: Send + Sync {
    fn find_by_id(&self, id: MovieId) -> Option<Arc<Movie>>;

    /// Case-insensitive title search. An empty query returns every movie.
    fn search(&self, query: &str) -> Vec<Arc<Movie>>;

    /// Movies sharing at least one person with `movie`, excluding itself.
    fn neighbors(&self, movie: &Movie) -> Vec<Arc<Movie>> {
        self.search("")
            .into_iter()
            .filter(|m| m.id != movie.id && are_connected(movie, m))
            .collect()
    }
}

// Loose on-disk encodings accepted at ingestion.

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGenres {
    Joined(String),
    List(Vec<RawGenre>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGenre {
    Name(String),
    Object { name: String },
}

#[derive(Deserialize)]
struct RawMovie {
    id: u64,
    title: String,
    #[serde(default, alias = "releaseYear", alias = "year")]
    release_year: i32,
    #[serde(default, alias = "genre")]
    genres: Option<RawGenres>,
    #[serde(default)]
    cast: Vec<Person>,
    #[serde(default)]
    crew: Vec<Person>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCatalog {
    List(Vec<RawMovie>),
    Wrapped { movies: Vec<RawMovie> },
}

fn normalize_genres(raw: Option<RawGenres>) -> GenreSet {
    let names: Vec<String> = match raw {
        None => Vec::new(),
        Some(RawGenres::Joined(s)) => s.split(',').map(str::to_string).collect(),
        Some(RawGenres::List(items)) => items
            .into_iter()
            .map(|g| match g {
                RawGenre::Name(name) | RawGenre::Object { name } => name,
            })
            .collect(),
    };
    names
        .iter()
        .map(|n| Genre::new(n))
        .filter(|g| !g.is_empty())
        .collect()
}

impl From<RawMovie> for Movie {
    fn from(raw: RawMovie) -> Self {
        Movie {
            id: MovieId(raw.id),
            title: raw.title,
            release_year: raw.release_year,
            genres: normalize_genres(raw.genres),
            cast: raw.cast,
            crew: raw.crew,
        }
    }
}

/// Catalog held entirely in memory with a person -> movies index.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    movies: HashMap<MovieId, Arc<Movie>>,
    by_person: HashMap<PersonId, Vec<MovieId>>,
    /// Ids sorted by (lowercase title, year, id) for stable search output.
    ordered: Vec<MovieId>,
}

impl InMemoryCatalog {
    pub fn from_movies(movies: impl IntoIterator<Item = Movie>) -> Result<Self, CatalogError> {
        let mut catalog = InMemoryCatalog::default();
        for movie in movies {
            if catalog.movies.contains_key(&movie.id) {
                return Err(CatalogError::DuplicateMovie(movie.id));
            }
            let mut people: Vec<PersonId> = movie.people().map(|p| p.id).collect();
            people.sort_unstable();
            people.dedup();
            for pid in people {
                catalog.by_person.entry(pid).or_default().push(movie.id);
            }
            catalog.movies.insert(movie.id, Arc::new(movie));
        }

        let mut ordered: Vec<&Arc<Movie>> = catalog.movies.values().collect();
        ordered.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then(a.release_year.cmp(&b.release_year))
                .then(a.id.cmp(&b.id))
        });
        catalog.ordered = ordered.into_iter().map(|m| m.id).collect();
        Ok(catalog)
    }

    /// Parse a JSON array of movie records (or `{"movies": [...]}`).
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        let records = match raw {
            RawCatalog::List(m) | RawCatalog::Wrapped { movies: m } => m,
        };
        Self::from_movies(records.into_iter().map(Movie::from))
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&content)?;
        tracing::info!(path = %path.display(), movies = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

impl CatalogLookup for InMemoryCatalog {
    fn find_by_id(&self, id: MovieId) -> Option<Arc<Movie>> {
        self.movies.get(&id).cloned()
    }

    fn search(&self, query: &str) -> Vec<Arc<Movie>> {
        let needle = query.trim().to_lowercase();
        self.ordered
            .iter()
            .filter_map(|id| self.movies.get(id))
            .filter(|m| needle.is_empty() || m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    fn neighbors(&self, movie: &Movie) -> Vec<Arc<Movie>> {
        let mut ids: Vec<MovieId> = movie
            .people()
            .filter_map(|p| self.by_person.get(&p.id))
            .flatten()
            .copied()
            .filter(|id| *id != movie.id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().filter_map(|id| self.find_by_id(id)).collect()
    }
}
