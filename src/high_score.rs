use crate::app_dirs::AppDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key the best score is stored under
pub const HIGH_SCORE_KEY: &str = "multiplicationHighScore";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("high score storage i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("high score database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Persistence boundary for the single best score
pub trait HighScoreStore {
    /// Missing or unparsable values read as 0.
    fn read_high_score(&self) -> u32;
    fn write_high_score(&mut self, score: u32) -> Result<(), StoreError>;
}

/// Key/value sqlite table holding the best score as decimal text
#[derive(Debug)]
pub struct SqliteHighScoreStore {
    conn: Connection,
}

impl SqliteHighScoreStore {
    /// Open the store at the default state location
    pub fn new() -> Result<Self, StoreError> {
        let path = AppDirs::high_score_path().unwrap_or_else(|| PathBuf::from("tabledrill.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    fn read_raw(&self) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                [HIGH_SCORE_KEY],
                |row| row.get(0),
            )
            .optional()
    }

    /// Store arbitrary text under the high score key
    pub fn write_raw(&self, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![HIGH_SCORE_KEY, value],
        )?;
        Ok(())
    }

    /// Forget the stored best score
    pub fn clear(&self) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [HIGH_SCORE_KEY])?;
        Ok(())
    }
}

impl HighScoreStore for SqliteHighScoreStore {
    fn read_high_score(&self) -> u32 {
        match self.read_raw() {
            Ok(Some(value)) => parse_score(&value),
            Ok(None) => 0,
            Err(e) => {
                log::warn!("could not read high score: {e}");
                0
            }
        }
    }

    fn write_high_score(&mut self, score: u32) -> Result<(), StoreError> {
        self.write_raw(&score.to_string())
    }
}

/// In-process store, used when the database cannot be opened
#[derive(Debug, Default, Clone)]
pub struct MemoryHighScoreStore {
    score: u32,
}

impl MemoryHighScoreStore {
    pub fn with_score(score: u32) -> Self {
        Self { score }
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn read_high_score(&self) -> u32 {
        self.score
    }

    fn write_high_score(&mut self, score: u32) -> Result<(), StoreError> {
        self.score = score;
        Ok(())
    }
}

impl<S: HighScoreStore + ?Sized> HighScoreStore for Box<S> {
    fn read_high_score(&self) -> u32 {
        (**self).read_high_score()
    }

    fn write_high_score(&mut self, score: u32) -> Result<(), StoreError> {
        (**self).write_high_score(score)
    }
}

/// Leading decimal digits are taken as the score; anything else is 0.
pub fn parse_score(value: &str) -> u32 {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
