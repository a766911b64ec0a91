//! SQLite-backed chat store.
//!
//! Chats and messages live in two tables joined by `chat_id`, with cascade
//! deletion so removing a chat removes its transcript in the same statement.
//! Timestamps are written by the application as fixed-width RFC 3339 strings
//! (microsecond precision, UTC), which keeps lexicographic and chronological
//! order identical for SQL `ORDER BY`.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use docchat_core::error::PersistError;
use docchat_core::types::{Chat, Message, Role, DEFAULT_CHAT_TITLE};

const SCHEMA: &str = "
    PRAGMA journal_mode=WAL;
    PRAGMA foreign_keys=ON;

    CREATE TABLE IF NOT EXISTS chats (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('user', 'assistant', 'system')),
        content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_messages_chat_id ON messages(chat_id);
";

/// SQLite-backed store for chats and their transcripts.
pub struct ChatStore {
    conn: Mutex<Connection>,
}

impl ChatStore {
    /// Open (or create) the database at the given path and run migrations.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PersistError::Init(format!("failed to create {}: {e}", parent.display()))
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .map_err(|e| PersistError::Init(format!("failed to open {}: {e}", db_path.display())))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        info!(path = %db_path.display(), "chat store ready");
        Ok(store)
    }

    fn migrate(&self) -> Result<(), PersistError> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| PersistError::Init(format!("migration failed: {e}")))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, PersistError> {
        self.conn
            .lock()
            .map_err(|_| PersistError::Database("connection lock poisoned".to_string()))
    }

    // ====== Chats ======

    /// Create a chat with the default title.
    pub fn create_chat(&self) -> Result<Chat, PersistError> {
        let conn = self.conn()?;
        let id = Uuid::new_v4();
        let now = Utc::now().trunc_subsecs(6);
        let now_str = format_timestamp(now);

        conn.execute(
            "INSERT INTO chats (id, title, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![id.to_string(), DEFAULT_CHAT_TITLE, now_str, now_str],
        )
        .map_err(db_err)?;

        debug!(chat_id = %id, "created chat");
        Ok(Chat {
            id,
            title: DEFAULT_CHAT_TITLE.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// List all chats, most recently active first.
    pub fn list_chats(&self) -> Result<Vec<Chat>, PersistError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, title, created_at, updated_at FROM chats ORDER BY updated_at DESC")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(db_err)?;

        let mut chats = Vec::new();
        for row in rows {
            let (id, title, created_at, updated_at) = row.map_err(db_err)?;
            chats.push(parse_chat(id, title, created_at, updated_at)?);
        }
        Ok(chats)
    }

    /// Fetch a single chat.
    pub fn get_chat(&self, id: Uuid) -> Result<Chat, PersistError> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT id, title, created_at, updated_at FROM chats WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        );

        match row {
            Ok((id, title, created_at, updated_at)) => {
                parse_chat(id, title, created_at, updated_at)
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(PersistError::ChatNotFound(id)),
            Err(e) => Err(db_err(e)),
        }
    }

    /// Rename a chat, bumping its activity timestamp.
    pub fn rename_chat(&self, id: Uuid, title: &str) -> Result<(), PersistError> {
        let conn = self.conn()?;
        let now_str = format_timestamp(Utc::now().trunc_subsecs(6));
        let changed = conn
            .execute(
                "UPDATE chats SET title = ?1, updated_at = ?2 WHERE id = ?3",
                params![title, now_str, id.to_string()],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(PersistError::ChatNotFound(id));
        }
        debug!(chat_id = %id, title, "renamed chat");
        Ok(())
    }

    /// Delete a chat and, via cascade, its messages.
    pub fn delete_chat(&self, id: Uuid) -> Result<(), PersistError> {
        let conn = self.conn()?;
        let changed = conn
            .execute("DELETE FROM chats WHERE id = ?1", params![id.to_string()])
            .map_err(db_err)?;

        if changed == 0 {
            return Err(PersistError::ChatNotFound(id));
        }
        info!(chat_id = %id, "deleted chat");
        Ok(())
    }

    // ====== Messages ======

    /// Append a message and bump the owning chat's activity timestamp in one
    /// transaction.
    pub fn append_message(
        &self,
        chat_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<Message, PersistError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;

        let exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM chats WHERE id = ?1)",
                params![chat_id.to_string()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        if !exists {
            return Err(PersistError::ChatNotFound(chat_id));
        }

        let now = Utc::now().trunc_subsecs(6);
        let now_str = format_timestamp(now);
        tx.execute(
            "INSERT INTO messages (chat_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![chat_id.to_string(), role.as_str(), content, now_str],
        )
        .map_err(db_err)?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE chats SET updated_at = ?1 WHERE id = ?2",
            params![now_str, chat_id.to_string()],
        )
        .map_err(db_err)?;

        tx.commit().map_err(db_err)?;
        debug!(chat_id = %chat_id, message_id = id, role = role.as_str(), "appended message");

        Ok(Message {
            id,
            chat_id,
            role,
            content: content.to_string(),
            created_at: now,
        })
    }

    /// Transcript of a chat in chronological order. Unknown chats yield an
    /// empty transcript rather than an error.
    pub fn get_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, PersistError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, chat_id, role, content, created_at FROM messages \
                 WHERE chat_id = ?1 ORDER BY created_at ASC, id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![chat_id.to_string()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(db_err)?;

        let mut messages = Vec::new();
        for row in rows {
            let (id, chat_id, role, content, created_at) = row.map_err(db_err)?;
            messages.push(Message {
                id,
                chat_id: parse_uuid(&chat_id)?,
                role: parse_role(&role)?,
                content,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(messages)
    }

    /// Number of messages in a chat.
    pub fn message_count(&self, chat_id: Uuid) -> Result<u64, PersistError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE chat_id = ?1",
                params![chat_id.to_string()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(count as u64)
    }
}

// ====== Row Conversion ======

fn db_err(e: rusqlite::Error) -> PersistError {
    PersistError::Database(e.to_string())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, PersistError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistError::Database(format!("invalid timestamp in database: {e}")))
}

fn parse_uuid(s: &str) -> Result<Uuid, PersistError> {
    Uuid::parse_str(s)
        .map_err(|e| PersistError::Database(format!("invalid chat id in database: {e}")))
}

fn parse_role(s: &str) -> Result<Role, PersistError> {
    Role::parse(s).ok_or_else(|| PersistError::Database(format!("invalid role in database: {s}")))
}

fn parse_chat(
    id: String,
    title: String,
    created_at: String,
    updated_at: String,
) -> Result<Chat, PersistError> {
    Ok(Chat {
        id: parse_uuid(&id)?,
        title,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::tempdir;

    fn create_test_store(dir: &Path) -> ChatStore {
        ChatStore::new(dir.join("chats.db")).unwrap()
    }

    #[test]
    fn test_create_chat_defaults() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let chat = store.create_chat().unwrap();
        assert_eq!(chat.title, DEFAULT_CHAT_TITLE);
        assert_eq!(chat.created_at, chat.updated_at);

        let fetched = store.get_chat(chat.id).unwrap();
        assert_eq!(fetched.id, chat.id);
        assert_eq!(fetched.title, chat.title);
        assert_eq!(fetched.created_at, chat.created_at);
        assert_eq!(fetched.updated_at, chat.updated_at);
    }

    #[test]
    fn test_get_chat_unknown() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let err = store.get_chat(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, PersistError::ChatNotFound(_)));
    }

    #[test]
    fn test_list_chats_orders_by_recency() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let first = store.create_chat().unwrap();
        sleep(Duration::from_millis(2));
        let second = store.create_chat().unwrap();

        let chats = store.list_chats().unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].id, second.id);
        assert_eq!(chats[1].id, first.id);

        // Appending to the older chat moves it back to the front.
        sleep(Duration::from_millis(2));
        store
            .append_message(first.id, Role::User, "hello")
            .unwrap();

        let chats = store.list_chats().unwrap();
        assert_eq!(chats[0].id, first.id);
        assert_eq!(chats[1].id, second.id);
    }

    #[test]
    fn test_rename_chat() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let chat = store.create_chat().unwrap();
        sleep(Duration::from_millis(2));
        store.rename_chat(chat.id, "How does login w...").unwrap();

        let fetched = store.get_chat(chat.id).unwrap();
        assert_eq!(fetched.title, "How does login w...");
        assert!(fetched.updated_at > fetched.created_at);
    }

    #[test]
    fn test_rename_unknown_chat() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let err = store.rename_chat(Uuid::new_v4(), "title").unwrap_err();
        assert!(matches!(err, PersistError::ChatNotFound(_)));
    }

    #[test]
    fn test_append_message_round_trip() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let chat = store.create_chat().unwrap();
        let msg = store
            .append_message(chat.id, Role::User, "How does login work?")
            .unwrap();

        assert_eq!(msg.chat_id, chat.id);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "How does login work?");

        let messages = store.get_messages(chat.id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, msg.id);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "How does login work?");
        assert_eq!(messages[0].created_at, msg.created_at);
    }

    #[test]
    fn test_append_bumps_chat_updated_at() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let chat = store.create_chat().unwrap();
        sleep(Duration::from_millis(2));
        let msg = store
            .append_message(chat.id, Role::Assistant, "answer")
            .unwrap();

        let fetched = store.get_chat(chat.id).unwrap();
        assert_eq!(fetched.updated_at, msg.created_at);
        assert!(fetched.updated_at > fetched.created_at);
    }

    #[test]
    fn test_append_to_unknown_chat() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let err = store
            .append_message(Uuid::new_v4(), Role::User, "hello")
            .unwrap_err();
        assert!(matches!(err, PersistError::ChatNotFound(_)));
    }

    #[test]
    fn test_messages_in_chronological_order() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let chat = store.create_chat().unwrap();
        store.append_message(chat.id, Role::User, "first").unwrap();
        store
            .append_message(chat.id, Role::Assistant, "second")
            .unwrap();
        store.append_message(chat.id, Role::User, "third").unwrap();

        let messages = store.get_messages(chat.id).unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert!(messages[0].id < messages[1].id);
        assert!(messages[1].id < messages[2].id);
    }

    #[test]
    fn test_message_roles_round_trip() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let chat = store.create_chat().unwrap();
        store.append_message(chat.id, Role::User, "q").unwrap();
        store.append_message(chat.id, Role::Assistant, "a").unwrap();
        store
            .append_message(chat.id, Role::System, "Processed notes.txt (3 chunks)")
            .unwrap();

        let messages = store.get_messages(chat.id).unwrap();
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::System]);
    }

    #[test]
    fn test_delete_chat_cascades_to_messages() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let chat = store.create_chat().unwrap();
        store.append_message(chat.id, Role::User, "one").unwrap();
        store.append_message(chat.id, Role::Assistant, "two").unwrap();
        assert_eq!(store.message_count(chat.id).unwrap(), 2);

        store.delete_chat(chat.id).unwrap();

        assert!(matches!(
            store.get_chat(chat.id).unwrap_err(),
            PersistError::ChatNotFound(_)
        ));
        assert!(store.get_messages(chat.id).unwrap().is_empty());
        assert_eq!(store.message_count(chat.id).unwrap(), 0);
        assert!(store.list_chats().unwrap().is_empty());
    }

    #[test]
    fn test_delete_unknown_chat() {
        let dir = tempdir().unwrap();
        let store = create_test_store(dir.path());

        let err = store.delete_chat(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, PersistError::ChatNotFound(_)));
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chats.db");

        let chat_id = {
            let store = ChatStore::new(&db_path).unwrap();
            let chat = store.create_chat().unwrap();
            store.append_message(chat.id, Role::User, "persisted").unwrap();
            chat.id
        };

        let store = ChatStore::new(&db_path).unwrap();
        let messages = store.get_messages(chat_id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "persisted");
    }

    #[test]
    fn test_timestamp_format_is_sortable() {
        let earlier = Utc::now().trunc_subsecs(6);
        let later = earlier + chrono::Duration::microseconds(1);

        let a = format_timestamp(earlier);
        let b = format_timestamp(later);
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_timestamp(&a).unwrap(), earlier);
    }
}
