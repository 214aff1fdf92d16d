// Persistence layer: categories of done tasks over an ordered keyspace

use crate::error::{Result, StoreError};
use crate::keys::{decode_task_id, encode_task_id, timestamp_now};
use crate::models::{Category, CategoryExport, Task};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Root namespace: one entry per category, keyed by the raw category name.
const ROOT_BUCKET: &[u8] = b"gigdb";

/// Joins the root bucket and a category name into a sub-bucket path.
/// Category names containing this byte are rejected at creation.
const BUCKET_SEP: u8 = 0;

/// How long `open` waits for the exclusive file lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Value stored under a category's root entry.
#[derive(Serialize, Deserialize)]
struct CategoryMeta {
    id: u64,
}

/// Handle to the single on-disk database. Owns the connection and an
/// exclusive sidecar file lock; both are released on drop.
#[derive(Debug)]
pub struct Store {
    db: Connection,
    path: PathBuf,
    _lock: File,
}

impl Store {
    /// Open or create the database at the given path, waiting up to
    /// [`DEFAULT_LOCK_TIMEOUT`] for the file lock.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_LOCK_TIMEOUT)
    }

    /// Open or create the database at the given path.
    ///
    /// Acquires an exclusive lock on a `<path>.lock` sidecar file, failing
    /// with [`StoreError::LockTimeout`] if another process still holds it
    /// after `lock_timeout`. The root namespace is created if absent.
    pub fn open_with_timeout<P: AsRef<Path>>(path: P, lock_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Init {
                    path: path.clone(),
                    source: Box::new(e),
                })?;
            }
        }

        let lock = Self::acquire_lock(&path, lock_timeout)?;

        let db = Connection::open(&path).map_err(|e| StoreError::Init {
            path: path.clone(),
            source: Box::new(e),
        })?;
        db.busy_timeout(lock_timeout)?;

        let store = Self { db, path, _lock: lock };
        store.create_schema()?;
        store.ensure_root()?;

        info!(path = %store.path.display(), "opened database");
        Ok(store)
    }

    /// Path of the database file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn acquire_lock(path: &Path, timeout: Duration) -> Result<File> {
        let mut lock_os: OsString = path.as_os_str().to_os_string();
        lock_os.push(".lock");
        let lock_path = PathBuf::from(lock_os);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StoreError::Init {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;

        let contended_kind = fs2::lock_contended_error().kind();
        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(file),
                Err(e) if e.kind() == contended_kind => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::LockTimeout {
                            path: path.to_path_buf(),
                            waited: timeout,
                        });
                    }
                    std::thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(e) => return Err(StoreError::Io(e)),
            }
        }
    }

    /// Create the keyspace schema. BLOB keys compare with memcmp, so
    /// `ORDER BY key` iterates each bucket in ascending byte order.
    fn create_schema(&self) -> Result<()> {
        debug!("creating schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                bucket BLOB NOT NULL,
                key    BLOB NOT NULL,
                value  BLOB NOT NULL,
                PRIMARY KEY (bucket, key)
            ) WITHOUT ROWID;

            CREATE TABLE IF NOT EXISTS sequences (
                bucket BLOB PRIMARY KEY,
                next   INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    /// Make sure the root namespace's sequence counter exists.
    fn ensure_root(&self) -> Result<()> {
        self.db.execute(
            "INSERT OR IGNORE INTO sequences (bucket, next) VALUES (?1, 0)",
            params![ROOT_BUCKET],
        )?;
        Ok(())
    }

    // ========================================================================
    // Write operations
    // ========================================================================

    /// Create a new category. Draws a display id from the root sequence and
    /// inserts the root entry in one transaction; fails with
    /// [`StoreError::CategoryAlreadyExists`] without consuming a sequence id
    /// if the name is already taken.
    pub fn create_category(&mut self, name: &str) -> Result<Category> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyCategoryName);
        }
        if name.bytes().any(|b| b == BUCKET_SEP) {
            return Err(StoreError::InvalidCategoryName(name.to_string()));
        }

        let tx = self.db.transaction()?;

        if Self::root_contains(&tx, name)? {
            return Err(StoreError::CategoryAlreadyExists(name.to_string()));
        }

        let id = Self::next_sequence(&tx, ROOT_BUCKET)?;
        let meta = serde_json::to_vec(&CategoryMeta { id })?;
        tx.execute(
            "INSERT INTO kv (bucket, key, value) VALUES (?1, ?2, ?3)",
            params![ROOT_BUCKET, name.as_bytes(), meta],
        )?;
        tx.commit()?;

        debug!(name, id, "created category");
        Ok(Category {
            id,
            name: name.to_string(),
        })
    }

    /// Record a done task under an existing category. The task id comes
    /// from the category's own sequence, so ids are gapless and increasing
    /// within each category.
    pub fn create_task(&mut self, category: &str, description: &str) -> Result<Task> {
        if description.trim().is_empty() {
            return Err(StoreError::EmptyDescription);
        }

        let tx = self.db.transaction()?;

        if !Self::root_contains(&tx, category)? {
            return Err(StoreError::CategoryNotFound(category.to_string()));
        }

        let bucket = category_bucket(category);
        let id = Self::next_sequence(&tx, &bucket)?;
        let task = Task {
            id,
            description: description.to_string(),
            created: timestamp_now(),
        };
        let record = serde_json::to_vec(&task)?;
        let key = encode_task_id(id).to_vec();
        tx.execute(
            "INSERT INTO kv (bucket, key, value) VALUES (?1, ?2, ?3)",
            params![bucket, key, record],
        )?;
        tx.commit()?;

        debug!(category, id, "created task");
        Ok(task)
    }

    // ========================================================================
    // Read operations
    // ========================================================================

    /// All categories, in ascending key (lexicographic) order. An empty
    /// result just means nothing has been created yet.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        Self::categories_in(&self.db)
    }

    /// All tasks of a category, in ascending id order. Fails with
    /// [`StoreError::CategoryNotFound`] if the category does not exist.
    pub fn list_tasks(&self, category: &str) -> Result<Vec<Task>> {
        if !Self::root_contains(&self.db, category)? {
            return Err(StoreError::CategoryNotFound(category.to_string()));
        }
        Self::tasks_in(&self.db, category)
    }

    /// Whether a category exists. Only fails on storage errors.
    pub fn category_exists(&self, name: &str) -> Result<bool> {
        Self::root_contains(&self.db, name)
    }

    /// Snapshot of the whole database: every category in ascending order
    /// with its tasks in ascending id order. Runs inside a single read
    /// transaction, so a concurrent write can never appear half-applied.
    pub fn export_data(&self) -> Result<Vec<CategoryExport>> {
        let tx = self.db.unchecked_transaction()?;

        let mut export = Vec::new();
        for category in Self::categories_in(&tx)? {
            let tasks = Self::tasks_in(&tx, &category.name)?;
            export.push(CategoryExport {
                category: category.name,
                tasks,
            });
        }
        tx.commit()?;

        info!(categories = export.len(), "exported database snapshot");
        Ok(export)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn root_contains(conn: &Connection, name: &str) -> Result<bool> {
        let hit = conn
            .query_row(
                "SELECT 1 FROM kv WHERE bucket = ?1 AND key = ?2",
                params![ROOT_BUCKET, name.as_bytes()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    /// Draw the next value from a bucket's sequence counter. First value
    /// handed out is 1. Must run inside the caller's write transaction.
    fn next_sequence(conn: &Connection, bucket: &[u8]) -> Result<u64> {
        conn.execute(
            "INSERT INTO sequences (bucket, next) VALUES (?1, 1)
             ON CONFLICT(bucket) DO UPDATE SET next = sequences.next + 1",
            params![bucket],
        )?;
        // SQLite integers are signed; counters never go negative
        let next: i64 = conn.query_row(
            "SELECT next FROM sequences WHERE bucket = ?1",
            params![bucket],
            |row| row.get(0),
        )?;
        Ok(next as u64)
    }

    fn categories_in(conn: &Connection) -> Result<Vec<Category>> {
        let mut stmt = conn.prepare("SELECT key, value FROM kv WHERE bucket = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![ROOT_BUCKET], |row| {
            Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut categories = Vec::new();
        for row in rows {
            let (key, value) = row?;
            let meta: CategoryMeta = serde_json::from_slice(&value)?;
            categories.push(Category {
                id: meta.id,
                name: String::from_utf8_lossy(&key).into_owned(),
            });
        }
        Ok(categories)
    }

    fn tasks_in(conn: &Connection, category: &str) -> Result<Vec<Task>> {
        let bucket = category_bucket(category);
        let mut stmt = conn.prepare("SELECT key, value FROM kv WHERE bucket = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![bucket], |row| {
            Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            let (key, value) = row?;
            let record: Task = serde_json::from_slice(&value)?;
            // The key is authoritative for the id
            let id = decode_task_id(&key)?;
            tasks.push(Task { id, ..record });
        }
        Ok(tasks)
    }
}

fn category_bucket(name: &str) -> Vec<u8> {
    let mut bucket = Vec::with_capacity(ROOT_BUCKET.len() + 1 + name.len());
    bucket.extend_from_slice(ROOT_BUCKET);
    bucket.push(BUCKET_SEP);
    bucket.extend_from_slice(name.as_bytes());
    bucket
}
