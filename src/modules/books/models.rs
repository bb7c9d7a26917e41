use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A book record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Opaque identifier assigned at creation
    pub id: String,
    pub name: String,
    pub year: i32,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    /// Derived: `page_count == read_page`
    pub finished: bool,
    pub reading: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub inserted_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Book {
    pub fn summary(&self) -> BookSummary {
        BookSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            publisher: self.publisher.clone(),
        }
    }
}

/// Every client-writable field of a book. Used for both insert and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub name: String,
    pub year: i32,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    pub reading: bool,
}

impl BookFields {
    pub fn is_finished(&self) -> bool {
        self.page_count == self.read_page
    }
}

/// Request body for create and update.
///
/// `name` may be absent so the handler can answer with the missing-name
/// message instead of a generic payload error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    #[serde(default)]
    pub name: Option<String>,
    pub year: i32,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    pub reading: bool,
}

impl From<BookPayload> for BookFields {
    fn from(payload: BookPayload) -> Self {
        Self {
            name: payload.name.unwrap_or_default(),
            year: payload.year,
            author: payload.author,
            summary: payload.summary,
            publisher: payload.publisher,
            page_count: payload.page_count,
            read_page: payload.read_page,
            reading: payload.reading,
        }
    }
}

/// Projection returned by list queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSummary {
    pub id: String,
    pub name: String,
    pub publisher: String,
}

/// A supplied `reading`/`finished` query flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Set(bool),
    /// Neither `0` nor `1`; no book carries such a value
    Invalid,
}

/// A single list predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    /// Case-insensitive substring match on `name`
    ByName(String),
    ByReading(bool),
    ByFinished(bool),
    /// Selected flag had an unusable value
    MatchNothing,
}

impl BookFilter {
    /// Pick the one predicate that applies: name, then reading, then finished.
    pub fn first_of(
        name: Option<String>,
        reading: Option<Flag>,
        finished: Option<Flag>,
    ) -> Option<Self> {
        if let Some(name) = name {
            return Some(BookFilter::ByName(name));
        }
        if let Some(flag) = reading {
            return Some(flag.into_filter(BookFilter::ByReading));
        }
        finished.map(|flag| flag.into_filter(BookFilter::ByFinished))
    }

    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::ByName(needle) => book.name.to_lowercase().contains(&needle.to_lowercase()),
            BookFilter::ByReading(reading) => book.reading == *reading,
            BookFilter::ByFinished(finished) => book.finished == *finished,
            BookFilter::MatchNothing => false,
        }
    }
}

impl Flag {
    fn into_filter(self, by: fn(bool) -> BookFilter) -> BookFilter {
        match self {
            Flag::Set(value) => by(value),
            Flag::Invalid => BookFilter::MatchNothing,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBook {
    pub book_id: String,
}

#[derive(Debug, Serialize)]
pub struct BookList {
    pub books: Vec<BookSummary>,
}

#[derive(Debug, Serialize)]
pub struct BookDetail {
    pub book: Book,
}
