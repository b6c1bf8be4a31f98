//! Session history.
//!
//! A session is an append-only transcript of [`ChatTurn`]s keyed by an opaque
//! session id. The pipeline only sees the [`SessionStore`] trait, so the
//! backing store can be swapped without touching answer logic.
//!
//! Neither store evicts: a session grows for as long as it is used.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::DocQaError;

// ============================================================================
// ChatTurn
// ============================================================================

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in a session. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

// ============================================================================
// SessionStore
// ============================================================================

/// Append-only per-session transcript storage.
pub trait SessionStore: Send + Sync {
    /// Append one turn.
    fn append(&self, session_id: &str, turn: ChatTurn) -> Result<(), DocQaError> {
        self.append_all(session_id, vec![turn])
    }

    /// Append several turns as one unit. Concurrent calls on the same store
    /// instance never interleave their turns. Separate instances sharing a
    /// backing directory or process give no such guarantee.
    fn append_all(&self, session_id: &str, turns: Vec<ChatTurn>) -> Result<(), DocQaError>;

    /// All turns of a session in insertion order. Unknown ids yield an
    /// empty list.
    fn get(&self, session_id: &str) -> Result<Vec<ChatTurn>, DocQaError>;
}

// ============================================================================
// InMemorySessionStore
// ============================================================================

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<ChatTurn>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(what: &str) -> DocQaError {
    DocQaError::SessionStore {
        path: PathBuf::from("<memory>"),
        message: format!("{} lock poisoned", what),
    }
}

impl SessionStore for InMemorySessionStore {
    fn append_all(&self, session_id: &str, turns: Vec<ChatTurn>) -> Result<(), DocQaError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned("session"))?;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .extend(turns);
        Ok(())
    }

    fn get(&self, session_id: &str) -> Result<Vec<ChatTurn>, DocQaError> {
        let sessions = self.sessions.read().map_err(|_| poisoned("session"))?;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }
}

// ============================================================================
// JsonlSessionStore
// ============================================================================

/// One JSONL file per session under a directory.
#[derive(Debug)]
pub struct JsonlSessionStore {
    dir: PathBuf,
    // Serializes appends so an exchange lands as two adjacent lines.
    write_lock: Mutex<()>,
}

impl JsonlSessionStore {
    /// Store rooted at `dir`. The directory is created on first append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `session_id`'s transcript.
    pub fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", file_stem(session_id)))
    }

    fn store_error(path: &Path, message: impl Into<String>) -> DocQaError {
        DocQaError::SessionStore {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// File-name-safe form of a session id.
///
/// Ids that are already safe map to themselves; anything else gets its
/// unsafe characters replaced plus a digest suffix so distinct ids never
/// share a file.
fn file_stem(session_id: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if !session_id.is_empty() && session_id.len() <= 64 && session_id.chars().all(is_safe) {
        return session_id.to_string();
    }

    let cleaned: String = session_id
        .chars()
        .take(48)
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect();
    let digest = Sha256::digest(session_id.as_bytes());
    let suffix: String = digest[..6].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", cleaned, suffix)
}

impl SessionStore for JsonlSessionStore {
    fn append_all(&self, session_id: &str, turns: Vec<ChatTurn>) -> Result<(), DocQaError> {
        let path = self.session_path(session_id);
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Self::store_error(&path, "write lock poisoned"))?;

        fs::create_dir_all(&self.dir).map_err(|e| {
            Self::store_error(&self.dir, format!("Failed to create session directory: {}", e))
        })?;

        let mut buf = String::new();
        for turn in &turns {
            let line = serde_json::to_string(turn)
                .map_err(|e| Self::store_error(&path, format!("Failed to serialize turn: {}", e)))?;
            buf.push_str(&line);
            buf.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Self::store_error(&path, format!("Failed to open session: {}", e)))?;
        file.write_all(buf.as_bytes())
            .map_err(|e| Self::store_error(&path, format!("Failed to write session: {}", e)))?;
        file.flush()
            .map_err(|e| Self::store_error(&path, format!("Failed to flush session: {}", e)))?;

        Ok(())
    }

    fn get(&self, session_id: &str) -> Result<Vec<ChatTurn>, DocQaError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)
            .map_err(|e| Self::store_error(&path, format!("Failed to open session: {}", e)))?;

        let mut turns = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                Self::store_error(&path, format!("Failed to read line {}: {}", line_num + 1, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let turn: ChatTurn = serde_json::from_str(&line).map_err(|e| {
                Self::store_error(&path, format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            turns.push(turn);
        }

        Ok(turns)
    }
}
