//! In-memory book collection and its write-time validation.

use thiserror::Error;

use super::models::{Book, BookFields, BookFilter, BookSummary};
use super::providers::{Clock, IdGenerator, NanoIdGenerator, SystemClock};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookStoreError {
    #[error("book name is required")]
    MissingName,
    #[error("readPage ({read_page}) exceeds pageCount ({page_count})")]
    ReadPageExceedsPageCount { read_page: u32, page_count: u32 },
    #[error("book {0} not found")]
    NotFound(String),
    #[error("book could not be stored")]
    GenericInsertFailure,
}

pub type BookStoreResult<T> = Result<T, BookStoreError>;

/// Ordered, exclusively owned collection of books.
///
/// Every mutator validates its input before touching the collection, so a
/// failed call leaves the store unchanged.
pub struct BookStore {
    books: Vec<Book>,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl BookStore {
    /// Store backed by the system clock and random ids
    pub fn new() -> Self {
        Self::with_providers(Box::new(SystemClock), Box::new(NanoIdGenerator))
    }

    pub fn with_providers(clock: Box<dyn Clock>, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            books: Vec::new(),
            clock,
            ids,
        }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Validate and append a new book, returning its id
    pub fn insert(&mut self, fields: BookFields) -> BookStoreResult<String> {
        validate(&fields)?;

        let id = self.ids.new_id();
        if self.position(&id).is_some() {
            tracing::error!(book_id = %id, "generated book id collides with a stored book");
            return Err(BookStoreError::GenericInsertFailure);
        }

        let now = self.clock.now();
        let finished = fields.is_finished();
        self.books.push(Book {
            id: id.clone(),
            name: fields.name,
            year: fields.year,
            author: fields.author,
            summary: fields.summary,
            publisher: fields.publisher,
            page_count: fields.page_count,
            read_page: fields.read_page,
            finished,
            reading: fields.reading,
            inserted_at: now,
            updated_at: now,
        });

        tracing::debug!(book_id = %id, total = self.books.len(), "book inserted");
        Ok(id)
    }

    /// Summaries of the books matching `filter`, in insertion order
    pub fn list(&self, filter: Option<&BookFilter>) -> Vec<BookSummary> {
        self.books
            .iter()
            .filter(|book| filter.map_or(true, |filter| filter.matches(book)))
            .map(Book::summary)
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> BookStoreResult<&Book> {
        self.books
            .iter()
            .find(|book| book.id == id)
            .ok_or_else(|| BookStoreError::NotFound(id.to_string()))
    }

    /// Replace every writable field of the book with `id`
    pub fn update(&mut self, id: &str, fields: BookFields) -> BookStoreResult<()> {
        validate(&fields)?;

        let index = self
            .position(id)
            .ok_or_else(|| BookStoreError::NotFound(id.to_string()))?;
        let now = self.clock.now();
        let finished = fields.is_finished();

        let book = &mut self.books[index];
        book.name = fields.name;
        book.year = fields.year;
        book.author = fields.author;
        book.summary = fields.summary;
        book.publisher = fields.publisher;
        book.page_count = fields.page_count;
        book.read_page = fields.read_page;
        book.reading = fields.reading;
        book.finished = finished;
        book.updated_at = now;

        tracing::debug!(book_id = %id, "book updated");
        Ok(())
    }

    pub fn delete_by_id(&mut self, id: &str) -> BookStoreResult<()> {
        let index = self
            .position(id)
            .ok_or_else(|| BookStoreError::NotFound(id.to_string()))?;
        self.books.remove(index);

        tracing::debug!(book_id = %id, total = self.books.len(), "book deleted");
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.books.iter().position(|book| book.id == id)
    }
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(fields: &BookFields) -> BookStoreResult<()> {
    if fields.name.is_empty() {
        return Err(BookStoreError::MissingName);
    }
    if fields.read_page > fields.page_count {
        return Err(BookStoreError::ReadPageExceedsPageCount {
            read_page: fields.read_page,
            page_count: fields.page_count,
        });
    }
    Ok(())
}
