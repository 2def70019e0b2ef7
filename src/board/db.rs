use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::models::*;
use crate::errors::BoardError;

/// Columns seeded into an empty database, in board order.
pub const DEFAULT_COLUMNS: [&str; 4] = ["Backlog", "Today", "In Progress", "Done"];

pub const DEFAULT_BOARD_NAME: &str = "My Kanban Board";

/// Async-safe handle to the board database.
///
/// Wraps `BoardDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O never
/// ties up async worker threads. Holding the mutex for the whole closure is
/// what makes read-then-write sequences (default placement, reorder batches)
/// atomic with respect to other requests.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<BoardDb>>,
}

impl DbHandle {
    pub fn new(db: BoardDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&BoardDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| BoardError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }

    /// Acquire the database mutex synchronously. Only for startup and tests.
    pub fn lock_sync(&self) -> Result<std::sync::MutexGuard<'_, BoardDb>> {
        self.inner
            .lock()
            .map_err(|_| BoardError::LockPoisoned.into())
    }
}

pub struct BoardDb {
    conn: Connection,
    path: Option<PathBuf>,
}

impl BoardDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn, path: None };
        db.init()?;
        Ok(db)
    }

    /// Path of the backing file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        if self.path.is_some() {
            let mode: String = self
                .conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .context("Failed to enable WAL journal")?;
            tracing::debug!(journal_mode = %mode, "Opened board database");
        }
        self.run_migrations().context("Failed to run migrations")?;
        self.seed_defaults().context("Failed to seed default board")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS board (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    name TEXT NOT NULL,
                    theme TEXT NOT NULL DEFAULT 'light',
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS columns (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    board_id INTEGER NOT NULL DEFAULT 1 REFERENCES board(id),
                    title TEXT NOT NULL,
                    order_index INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS members (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    color TEXT NOT NULL DEFAULT '#6366f1',
                    avatar TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS cards (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    board_id INTEGER NOT NULL DEFAULT 1 REFERENCES board(id),
                    column_id INTEGER NOT NULL REFERENCES columns(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    description TEXT,
                    assignee_id INTEGER REFERENCES members(id) ON DELETE SET NULL,
                    color TEXT,
                    emoji TEXT,
                    tags TEXT NOT NULL DEFAULT '[]',
                    due_date TEXT,
                    order_index INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE INDEX IF NOT EXISTS idx_columns_order ON columns(board_id, order_index);
                CREATE INDEX IF NOT EXISTS idx_cards_column_order ON cards(column_id, order_index);
                CREATE INDEX IF NOT EXISTS idx_cards_assignee ON cards(assignee_id);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    fn seed_defaults(&self) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO board (id, name, theme) VALUES (?1, ?2, 'light')",
                params![BOARD_ID, DEFAULT_BOARD_NAME],
            )
            .context("Failed to insert board row")?;

        let column_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM columns", [], |row| row.get(0))
            .context("Failed to count columns")?;
        if column_count == 0 {
            for (index, title) in DEFAULT_COLUMNS.iter().enumerate() {
                self.conn
                    .execute(
                        "INSERT INTO columns (board_id, title, order_index) VALUES (?1, ?2, ?3)",
                        params![BOARD_ID, title, index as i64],
                    )
                    .context("Failed to seed default column")?;
            }
        }
        Ok(())
    }

    // ── Board ─────────────────────────────────────────────────────────

    pub fn get_board(&self) -> Result<Board> {
        let (id, name, theme, updated_at): (i64, String, String, String) = self
            .conn
            .query_row(
                "SELECT id, name, theme, updated_at FROM board WHERE id = ?1",
                params![BOARD_ID],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .context("Failed to read board row")?;
        Ok(Board {
            id,
            name,
            // A hand-edited theme value falls back to light rather than
            // making the whole board unreadable.
            theme: Theme::from_str(&theme).unwrap_or_default(),
            updated_at,
        })
    }

    pub fn update_board(&self, name: &str, theme: Theme) -> Result<Board> {
        self.conn
            .execute(
                "UPDATE board SET name = ?1, theme = ?2, updated_at = datetime('now') WHERE id = ?3",
                params![name, theme.as_str(), BOARD_ID],
            )
            .context("Failed to update board")?;
        self.get_board()
    }

    pub fn get_board_view(&self) -> Result<BoardView> {
        Ok(BoardView {
            board: self.get_board()?,
            columns: self.list_columns()?,
            cards: self.list_cards()?,
            members: self.list_members()?,
        })
    }

    pub fn export_board(&self) -> Result<BoardExport> {
        Ok(BoardExport {
            board: self.get_board()?,
            columns: self.list_columns()?,
            cards: self.list_cards()?,
            members: self.list_members()?,
            exported_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Checkpoint the WAL into the main file and return the file's bytes.
    /// Returns `None` for in-memory databases.
    pub fn backup_bytes(&self) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.path.as_ref() else {
            return Ok(None);
        };
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            .context("Failed to checkpoint WAL")?;
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read database file {}", path.display()))?;
        Ok(Some(bytes))
    }

    // ── Columns ───────────────────────────────────────────────────────

    pub fn list_columns(&self) -> Result<Vec<Column>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, board_id, title, order_index, created_at, updated_at
                 FROM columns ORDER BY order_index, id",
            )
            .context("Failed to prepare list_columns")?;
        let rows = stmt
            .query_map([], column_from_row)
            .context("Failed to query columns")?;
        let mut columns = Vec::new();
        for row in rows {
            columns.push(row.context("Failed to read column row")?);
        }
        Ok(columns)
    }

    pub fn get_column(&self, id: i64) -> Result<Option<Column>> {
        self.conn
            .query_row(
                "SELECT id, board_id, title, order_index, created_at, updated_at
                 FROM columns WHERE id = ?1",
                params![id],
                column_from_row,
            )
            .optional()
            .context("Failed to query column")
    }

    /// Insert a column. Without an explicit position it goes after the
    /// current last column.
    pub fn create_column(&self, title: &str, order_index: Option<i64>) -> Result<Column> {
        let order_index = match order_index {
            Some(index) => index,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM columns", [], |row| row.get(0))
                .context("Failed to count columns")?,
        };
        self.conn
            .execute(
                "INSERT INTO columns (board_id, title, order_index) VALUES (?1, ?2, ?3)",
                params![BOARD_ID, title, order_index],
            )
            .context("Failed to insert column")?;
        let id = self.conn.last_insert_rowid();
        self.get_column(id)?.context("Column not found after insert")
    }

    pub fn update_column(&self, id: i64, title: &str, order_index: Option<i64>) -> Result<Column> {
        let count = self
            .conn
            .execute(
                "UPDATE columns
                 SET title = ?1, order_index = COALESCE(?2, order_index), updated_at = datetime('now')
                 WHERE id = ?3",
                params![title, order_index, id],
            )
            .context("Failed to update column")?;
        if count == 0 {
            return Err(BoardError::ColumnNotFound { id }.into());
        }
        self.get_column(id)?.context("Column not found after update")
    }

    /// Delete a column and, through the foreign key cascade, its cards.
    /// The board must keep at least one column.
    pub fn delete_column(&self, id: i64) -> Result<()> {
        if !self.column_exists(id)? {
            return Err(BoardError::ColumnNotFound { id }.into());
        }
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM columns", [], |row| row.get(0))
            .context("Failed to count columns")?;
        if count <= 1 {
            return Err(BoardError::LastColumn.into());
        }
        self.conn
            .execute("DELETE FROM columns WHERE id = ?1", params![id])
            .context("Failed to delete column")?;
        Ok(())
    }

    /// Apply a column reorder batch atomically and return every column in
    /// its new order.
    ///
    /// Entries naming a missing column are skipped, unless `strict` is set,
    /// in which case the whole batch is rolled back with `ColumnNotFound`.
    pub fn reorder_columns(&self, orders: &[ColumnOrder], strict: bool) -> Result<Vec<Column>> {
        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        for order in orders {
            let count = tx
                .execute(
                    "UPDATE columns SET order_index = ?1 WHERE id = ?2",
                    params![order.order_index, order.id],
                )
                .context("Failed to update column order")?;
            if count == 0 && strict {
                return Err(BoardError::ColumnNotFound { id: order.id }.into());
            }
        }
        tx.commit().context("Failed to commit column reorder")?;
        self.list_columns()
    }

    fn column_exists(&self, id: i64) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM columns WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .context("Failed to check column existence")
    }

    // ── Cards ─────────────────────────────────────────────────────────

    pub fn list_cards(&self) -> Result<Vec<Card>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {CARD_FIELDS} FROM cards ORDER BY order_index, id"
            ))
            .context("Failed to prepare list_cards")?;
        let rows = stmt
            .query_map([], CardRow::from_row)
            .context("Failed to query cards")?;
        let mut cards = Vec::new();
        for row in rows {
            let r = row.context("Failed to read card row")?;
            cards.push(r.into_card()?);
        }
        Ok(cards)
    }

    pub fn get_card(&self, id: i64) -> Result<Option<Card>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {CARD_FIELDS} FROM cards WHERE id = ?1"),
                params![id],
                CardRow::from_row,
            )
            .optional()
            .context("Failed to query card")?;
        row.map(CardRow::into_card).transpose()
    }

    /// Insert a card. Without an explicit position it is appended to its
    /// column, counting the column's cards in this same call.
    pub fn create_card(&self, card: &NewCard) -> Result<Card> {
        if !self.column_exists(card.column_id)? {
            return Err(
                BoardError::validation(format!("Column {} does not exist", card.column_id)).into(),
            );
        }
        if let Some(member_id) = card.assignee_id {
            self.ensure_assignee(member_id)?;
        }
        let order_index = match card.order_index {
            Some(index) => index,
            None => self
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM cards WHERE column_id = ?1",
                    params![card.column_id],
                    |row| row.get(0),
                )
                .context("Failed to count cards in column")?,
        };
        let tags = serde_json::to_string(&card.tags).context("Failed to encode card tags")?;
        self.conn
            .execute(
                "INSERT INTO cards
                 (board_id, column_id, title, description, assignee_id, color, emoji, tags, due_date, order_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    BOARD_ID,
                    card.column_id,
                    card.title,
                    card.description,
                    card.assignee_id,
                    card.color,
                    card.emoji,
                    tags,
                    card.due_date,
                    order_index,
                ],
            )
            .context("Failed to insert card")?;
        let id = self.conn.last_insert_rowid();
        self.get_card(id)?.context("Card not found after insert")
    }

    /// Partial update: every `None` in `changes` keeps the stored value.
    pub fn update_card(&self, id: i64, changes: &CardChanges) -> Result<Card> {
        if self.get_card(id)?.is_none() {
            return Err(BoardError::CardNotFound { id }.into());
        }
        if let Some(column_id) = changes.column_id
            && !self.column_exists(column_id)?
        {
            return Err(
                BoardError::validation(format!("Column {} does not exist", column_id)).into(),
            );
        }
        if let Some(member_id) = changes.assignee_id {
            self.ensure_assignee(member_id)?;
        }
        let tags = changes
            .tags
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to encode card tags")?;
        self.conn
            .execute(
                "UPDATE cards SET
                    column_id = COALESCE(?1, column_id),
                    title = COALESCE(?2, title),
                    description = COALESCE(?3, description),
                    assignee_id = COALESCE(?4, assignee_id),
                    color = COALESCE(?5, color),
                    emoji = COALESCE(?6, emoji),
                    tags = COALESCE(?7, tags),
                    due_date = COALESCE(?8, due_date),
                    order_index = COALESCE(?9, order_index),
                    updated_at = datetime('now')
                 WHERE id = ?10",
                params![
                    changes.column_id,
                    changes.title,
                    changes.description,
                    changes.assignee_id,
                    changes.color,
                    changes.emoji,
                    tags,
                    changes.due_date,
                    changes.order_index,
                    id,
                ],
            )
            .context("Failed to update card")?;
        self.get_card(id)?.context("Card not found after update")
    }

    pub fn delete_card(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM cards WHERE id = ?1", params![id])
            .context("Failed to delete card")?;
        Ok(count > 0)
    }

    /// Apply a card reorder batch atomically and return every card in its
    /// new order. Entries apply in the order given.
    ///
    /// An entry naming a missing card or a missing target column is skipped,
    /// unless `strict` is set, in which case the whole batch is rolled back
    /// with `CardNotFound` / `ColumnNotFound`.
    pub fn reorder_cards(&self, orders: &[CardOrder], strict: bool) -> Result<Vec<Card>> {
        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        for order in orders {
            if let Some(column_id) = order.column_id {
                let exists: bool = tx
                    .query_row(
                        "SELECT COUNT(*) > 0 FROM columns WHERE id = ?1",
                        params![column_id],
                        |row| row.get(0),
                    )
                    .context("Failed to check column existence")?;
                if !exists {
                    if strict {
                        return Err(BoardError::ColumnNotFound { id: column_id }.into());
                    }
                    continue;
                }
            }
            let count = tx
                .execute(
                    "UPDATE cards SET column_id = COALESCE(?1, column_id), order_index = ?2 WHERE id = ?3",
                    params![order.column_id, order.order_index, order.id],
                )
                .context("Failed to update card order")?;
            if count == 0 && strict {
                return Err(BoardError::CardNotFound { id: order.id }.into());
            }
        }
        tx.commit().context("Failed to commit card reorder")?;
        self.list_cards()
    }

    fn ensure_assignee(&self, member_id: i64) -> Result<()> {
        if self.get_member(member_id)?.is_none() {
            return Err(
                BoardError::validation(format!("Member {} does not exist", member_id)).into(),
            );
        }
        Ok(())
    }

    // ── Members ───────────────────────────────────────────────────────

    pub fn list_members(&self) -> Result<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, color, avatar, created_at, updated_at
                 FROM members ORDER BY name, id",
            )
            .context("Failed to prepare list_members")?;
        let rows = stmt
            .query_map([], member_from_row)
            .context("Failed to query members")?;
        let mut members = Vec::new();
        for row in rows {
            members.push(row.context("Failed to read member row")?);
        }
        Ok(members)
    }

    pub fn get_member(&self, id: i64) -> Result<Option<Member>> {
        self.conn
            .query_row(
                "SELECT id, name, color, avatar, created_at, updated_at FROM members WHERE id = ?1",
                params![id],
                member_from_row,
            )
            .optional()
            .context("Failed to query member")
    }

    pub fn create_member(
        &self,
        name: &str,
        color: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<Member> {
        self.conn
            .execute(
                "INSERT INTO members (name, color, avatar) VALUES (?1, ?2, ?3)",
                params![name, color.unwrap_or(DEFAULT_MEMBER_COLOR), avatar],
            )
            .context("Failed to insert member")?;
        let id = self.conn.last_insert_rowid();
        self.get_member(id)?.context("Member not found after insert")
    }

    pub fn update_member(
        &self,
        id: i64,
        name: &str,
        color: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<Member> {
        let count = self
            .conn
            .execute(
                "UPDATE members
                 SET name = ?1, color = COALESCE(?2, color), avatar = COALESCE(?3, avatar),
                     updated_at = datetime('now')
                 WHERE id = ?4",
                params![name, color, avatar, id],
            )
            .context("Failed to update member")?;
        if count == 0 {
            return Err(BoardError::MemberNotFound { id }.into());
        }
        self.get_member(id)?.context("Member not found after update")
    }

    /// Delete a member. Their cards stay, unassigned.
    pub fn delete_member(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM members WHERE id = ?1", params![id])
            .context("Failed to delete member")?;
        Ok(count > 0)
    }
}

// ── Internal row helpers ──────────────────────────────────────────────

const CARD_FIELDS: &str = "id, board_id, column_id, title, description, assignee_id, color, emoji, \
     tags, due_date, order_index, created_at, updated_at";

fn column_from_row(row: &Row<'_>) -> rusqlite::Result<Column> {
    Ok(Column {
        id: row.get(0)?,
        board_id: row.get(1)?,
        title: row.get(2)?,
        order_index: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        avatar: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Intermediate row struct for reading cards before decoding the tags JSON.
struct CardRow {
    id: i64,
    board_id: i64,
    column_id: i64,
    title: String,
    description: Option<String>,
    assignee_id: Option<i64>,
    color: Option<String>,
    emoji: Option<String>,
    tags: Option<String>,
    due_date: Option<String>,
    order_index: i64,
    created_at: String,
    updated_at: String,
}

impl CardRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            board_id: row.get(1)?,
            column_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            assignee_id: row.get(5)?,
            color: row.get(6)?,
            emoji: row.get(7)?,
            tags: row.get(8)?,
            due_date: row.get(9)?,
            order_index: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_card(self) -> Result<Card> {
        let tags: Vec<String> = match self.tags.as_deref() {
            None | Some("") => Vec::new(),
            Some(raw) => serde_json::from_str(raw).context("Failed to parse card tags JSON")?,
        };
        Ok(Card {
            id: self.id,
            board_id: self.board_id,
            column_id: self.column_id,
            title: self.title,
            description: self.description,
            assignee_id: self.assignee_id,
            color: self.color,
            emoji: self.emoji,
            tags,
            due_date: self.due_date,
            order_index: self.order_index,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
