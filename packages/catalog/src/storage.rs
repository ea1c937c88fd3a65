// ABOUTME: Book storage layer using SQLite
// ABOUTME: Catalog queries plus executor-level helpers shared with the workflows

use bookshare_core::{join_tags, split_tags};
use bookshare_storage::StorageError;
use chrono::Utc;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::types::{Book, BookCreateInput, BookFilter, BookSource, BookStatus, BookUpdateInput};

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.author, b.publisher, b.isbn, b.tags, b.source,
           b.donor_id, u.name AS donor_name, b.status, b.created_at
    FROM books b
    LEFT JOIN users u ON u.id = b.donor_id
"#;

/// Fields of a book about to be inserted
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub isbn: String,
    pub tags: Vec<String>,
    pub source: BookSource,
    pub donor_id: Option<i64>,
}

/// Insert an `available` book and return its id
pub async fn insert_book<'e>(
    executor: impl SqliteExecutor<'e>,
    book: &NewBook,
) -> Result<i64, StorageError> {
    let result = sqlx::query(
        r#"
        INSERT INTO books (title, author, publisher, isbn, tags, source, donor_id, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.publisher)
    .bind(&book.isbn)
    .bind(join_tags(&book.tags))
    .bind(book.source.as_str())
    .bind(book.donor_id)
    .bind(BookStatus::Available.as_str())
    .bind(Utc::now())
    .execute(executor)
    .await
    .map_err(StorageError::Sqlx)?;

    Ok(result.last_insert_rowid())
}

pub async fn fetch_book<'e>(
    executor: impl SqliteExecutor<'e>,
    book_id: i64,
) -> Result<Option<Book>, StorageError> {
    let row = sqlx::query(&format!("{} WHERE b.id = ?", BOOK_SELECT))
        .bind(book_id)
        .fetch_optional(executor)
        .await
        .map_err(StorageError::Sqlx)?;

    row.as_ref().map(row_to_book).transpose()
}

pub struct BookStorage {
    pool: SqlitePool,
}

impl BookStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List books, newest first. `keyword` matches title, author or tags.
    pub async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, StorageError> {
        let keyword = filter
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(escape_like);

        debug!("Listing books (keyword: {:?})", keyword);

        let rows = sqlx::query(&format!(
            r#"{}
            WHERE (?1 IS NULL
                   OR b.title LIKE '%' || ?1 || '%' ESCAPE '\'
                   OR b.author LIKE '%' || ?1 || '%' ESCAPE '\'
                   OR b.tags LIKE '%' || ?1 || '%' ESCAPE '\')
              AND (?2 IS NULL OR b.status = ?2)
              AND (?3 IS NULL OR b.source = ?3)
            ORDER BY b.id DESC
            "#,
            BOOK_SELECT
        ))
        .bind(keyword)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.source.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_book).collect()
    }

    pub async fn get_book(&self, book_id: i64) -> Result<Book, StorageError> {
        fetch_book(&self.pool, book_id)
            .await?
            .ok_or_else(|| StorageError::not_found("Book", book_id))
    }

    pub async fn create_book(&self, input: BookCreateInput) -> Result<Book, StorageError> {
        let title = required("Title", &input.title)?;
        let author = required("Author", &input.author)?;
        let publisher = required("Publisher", &input.publisher)?;

        let source = input.source.unwrap_or_default();
        match (source, input.donor_id) {
            (BookSource::Donated, None) => {
                return Err(StorageError::Validation(
                    "A donated book needs a donor".to_string(),
                ))
            }
            (BookSource::Class, Some(_)) => {
                return Err(StorageError::Validation(
                    "Only donated books can have a donor".to_string(),
                ))
            }
            _ => {}
        }

        if let Some(donor_id) = input.donor_id {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
                .bind(donor_id)
                .fetch_one(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;
            if !exists {
                return Err(StorageError::Validation(format!(
                    "Donor user {} does not exist",
                    donor_id
                )));
            }
        }

        let book = NewBook {
            title,
            author,
            publisher,
            isbn: input.isbn.unwrap_or_default().trim().to_string(),
            tags: input.tags.map(|t| t.into_inner()).unwrap_or_default(),
            source,
            donor_id: input.donor_id,
        };

        let book_id = insert_book(&self.pool, &book).await?;
        info!("Added book {} '{}'", book_id, book.title);

        self.get_book(book_id).await
    }

    /// Update descriptive fields; omitted fields keep their value
    pub async fn update_book(&self, book_id: i64, input: BookUpdateInput) -> Result<Book, StorageError> {
        let title = input.title.as_deref().map(|t| required("Title", t)).transpose()?;
        let author = input.author.as_deref().map(|a| required("Author", a)).transpose()?;
        let publisher = input
            .publisher
            .as_deref()
            .map(|p| required("Publisher", p))
            .transpose()?;

        debug!("Updating book: {}", book_id);

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = COALESCE(?, title),
                author = COALESCE(?, author),
                publisher = COALESCE(?, publisher),
                isbn = COALESCE(?, isbn),
                tags = COALESCE(?, tags)
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(author)
        .bind(publisher)
        .bind(input.isbn.map(|i| i.trim().to_string()))
        .bind(input.tags.map(|t| t.as_stored()))
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Book", book_id));
        }

        self.get_book(book_id).await
    }
}

/// Make `%`, `_` and `\` match literally in a `LIKE ... ESCAPE '\'` pattern
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn required(field: &str, value: &str) -> Result<String, StorageError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StorageError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn row_to_book(row: &sqlx::sqlite::SqliteRow) -> Result<Book, StorageError> {
    let tags: String = row.try_get("tags").map_err(StorageError::Sqlx)?;
    let source: String = row.try_get("source").map_err(StorageError::Sqlx)?;
    let status: String = row.try_get("status").map_err(StorageError::Sqlx)?;

    Ok(Book {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        title: row.try_get("title").map_err(StorageError::Sqlx)?,
        author: row.try_get("author").map_err(StorageError::Sqlx)?,
        publisher: row.try_get("publisher").map_err(StorageError::Sqlx)?,
        isbn: row.try_get("isbn").map_err(StorageError::Sqlx)?,
        tags: split_tags(&tags),
        source: source.parse().map_err(StorageError::Database)?,
        donor_id: row.try_get("donor_id").map_err(StorageError::Sqlx)?,
        donor_name: row.try_get("donor_name").map_err(StorageError::Sqlx)?,
        status: status.parse().map_err(StorageError::Database)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
    })
}
