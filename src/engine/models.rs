//! Core catalog data types: movies, people and genres.
//!
//! Everything here is immutable once ingested. The engine reads movies, it
//! never edits them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
}

impl Person {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: PersonId(id),
            name: name.into(),
        }
    }
}

/// Alternate spellings that collapse onto one canonical genre name.
static GENRE_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("sci-fi", "science fiction"),
        ("scifi", "science fiction"),
        ("sci fi", "science fiction"),
        ("science-fiction", "science fiction"),
        ("tv-movie", "tv movie"),
        ("film-noir", "film noir"),
        ("rom-com", "romance"),
    ])
});

/// A genre tag, normalized to trimmed lowercase with aliases resolved.
///
/// Normalization happens once at construction so comparisons at use-sites are
/// plain string equality: `Genre::new("Sci-Fi") == Genre::new("science fiction")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Genre(String);

impl Genre {
    pub fn new(raw: &str) -> Self {
        let collapsed = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        match GENRE_ALIASES.get(collapsed.as_str()) {
            Some(canonical) => Genre((*canonical).to_string()),
            None => Genre(collapsed),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Genre {
    fn from(raw: String) -> Self {
        Genre::new(&raw)
    }
}

impl From<&str> for Genre {
    fn from(raw: &str) -> Self {
        Genre::new(raw)
    }
}

impl From<Genre> for String {
    fn from(genre: Genre) -> Self {
        genre.0
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type GenreSet = BTreeSet<Genre>;

/// A movie record as returned by catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub release_year: i32,
    #[serde(default)]
    pub genres: GenreSet,
    #[serde(default)]
    pub cast: Vec<Person>,
    #[serde(default)]
    pub crew: Vec<Person>,
}

impl Movie {
    /// Cast followed by crew, in catalog order.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.cast.iter().chain(self.crew.iter())
    }

    pub fn has_genre(&self, genre: &Genre) -> bool {
        self.genres.contains(genre)
    }

    pub fn summary(&self) -> MovieSummary {
        MovieSummary {
            id: self.id,
            title: self.title.clone(),
            release_year: self.release_year,
            genres: self.genres.clone(),
        }
    }
}

/// Lightweight projection of a movie for snapshots and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    pub release_year: i32,
    pub genres: GenreSet,
}
