//! File System Session Store
//!
//! Information Hiding:
//! - One JSON file per session under the base directory
//! - Session ids are escaped into file names one-to-one, so distinct ids
//!   never share a file

use super::{LinkageToken, SessionStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Files are stored as {base_path}/{session_id}.json
pub struct FileSystemSessionStore {
    base_path: PathBuf,
}

impl FileSystemSessionStore {
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path)
            .await
            .context("Failed to create session directory")?;

        Ok(Self { base_path })
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.json", escape_file_stem(session_id)))
    }
}

/// ASCII alphanumerics and `-` pass through; every other byte, `_` included,
/// becomes `_XX`. Decoding is unambiguous, so the mapping is injective.
fn escape_file_stem(session_id: &str) -> String {
    let mut stem = String::with_capacity(session_id.len());
    for byte in session_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("_{:02X}", byte));
        }
    }
    stem
}

#[async_trait]
impl SessionStore for FileSystemSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<LinkageToken>> {
        let path = self.session_path(session_id);

        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .await
            .context(format!("Failed to read session file: {:?}", path))?;

        let token: LinkageToken =
            serde_json::from_str(&json).context("Failed to deserialize session token")?;

        tracing::debug!(
            "[FileSystemSessionStore] Loaded token for session '{}' from {:?}",
            session_id,
            path
        );
        Ok(Some(token))
    }

    async fn save(&self, session_id: &str, token: &LinkageToken) -> Result<()> {
        let path = self.session_path(session_id);
        let json = serde_json::to_string_pretty(token).context("Failed to serialize session token")?;

        fs::write(&path, json)
            .await
            .context(format!("Failed to write session file: {:?}", path))?;

        tracing::debug!(
            "[FileSystemSessionStore] Saved token for session '{}' to {:?}",
            session_id,
            path
        );
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        let path = self.session_path(session_id);

        if path.exists() {
            fs::remove_file(&path)
                .await
                .context(format!("Failed to delete session file: {:?}", path))?;
            tracing::debug!("[FileSystemSessionStore] Cleared session '{}'", session_id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemSessionStore::new(temp_dir.path().to_path_buf())
            .await
            .unwrap();

        let token = LinkageToken::Conversation("conv_1".to_string());
        store.save("user-1", &token).await.unwrap();

        assert_eq!(store.load("user-1").await.unwrap(), Some(token));
        assert_eq!(store.load("user-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemSessionStore::new(temp_dir.path().to_path_buf())
            .await
            .unwrap();

        store
            .save("user-1", &LinkageToken::PreviousResponse("resp_1".to_string()))
            .await
            .unwrap();
        store.clear("user-1").await.unwrap();
        assert_eq!(store.load("user-1").await.unwrap(), None);

        // nothing to delete
        store.clear("user-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let store = FileSystemSessionStore::new(path.clone()).await.unwrap();
            store
                .save("persist", &LinkageToken::Conversation("conv_7".to_string()))
                .await
                .unwrap();
        }

        {
            let store = FileSystemSessionStore::new(path).await.unwrap();
            let token = store.load("persist").await.unwrap().unwrap();
            assert_eq!(token.value(), "conv_7");
        }
    }

    #[tokio::test]
    async fn test_session_ids_cannot_escape_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemSessionStore::new(temp_dir.path().to_path_buf())
            .await
            .unwrap();

        let path = store.session_path("../../etc/passwd");
        assert_eq!(path.parent().unwrap(), temp_dir.path());
    }

    #[tokio::test]
    async fn test_similar_ids_do_not_share_linkage() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemSessionStore::new(temp_dir.path().to_path_buf())
            .await
            .unwrap();

        store
            .save("alice@example.com", &LinkageToken::Conversation("conv_alice".to_string()))
            .await
            .unwrap();

        for other in ["alice_example_com", "alice_40example_2Ecom", "alice@example_com"] {
            assert_eq!(store.load(other).await.unwrap(), None, "{}", other);
        }
        assert_eq!(
            store.load("alice@example.com").await.unwrap(),
            Some(LinkageToken::Conversation("conv_alice".to_string()))
        );
    }

    #[test]
    fn test_escape_is_one_to_one() {
        assert_eq!(escape_file_stem("user-1"), "user-1");
        assert_eq!(escape_file_stem("a_b"), "a_5Fb");
        assert_eq!(escape_file_stem("a@b"), "a_40b");
        assert_ne!(escape_file_stem("a_40b"), escape_file_stem("a@b"));
        assert_eq!(escape_file_stem("../x"), "_2E_2E_2Fx");
    }
}
