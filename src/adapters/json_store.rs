use crate::domain::model::{AccessEntry, ReportEntry};
use crate::domain::ports::{AccessStore, ReportStore};
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const USERS_FILE: &str = "users.json";
pub const REPORTS_FILE: &str = "reports.json";

/// `users.json` 的內容
#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersDocument {
    #[serde(default)]
    users: Vec<AccessEntry>,
    #[serde(default)]
    admin: Vec<String>,
}

/// `reports.json` 的內容
#[derive(Debug, Default, Serialize, Deserialize)]
struct ReportsDocument {
    #[serde(default)]
    reports: Vec<ReportEntry>,
}

/// Allow-list and report log kept as two pretty-printed JSON files.
///
/// Each file has its own lock, held across the whole read-modify-write, so
/// concurrent commands cannot lose each other's updates. Writes go to a
/// temporary file that is then renamed over the original.
#[derive(Debug)]
pub struct JsonFileStore {
    users_path: PathBuf,
    reports_path: PathBuf,
    users_lock: Mutex<()>,
    reports_lock: Mutex<()>,
}

impl JsonFileStore {
    /// 開啟資料目錄，不存在的檔案會以空內容建立
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir).await?;

        let store = Self {
            users_path: data_dir.join(USERS_FILE),
            reports_path: data_dir.join(REPORTS_FILE),
            users_lock: Mutex::new(()),
            reports_lock: Mutex::new(()),
        };

        if !tokio::fs::try_exists(&store.users_path).await? {
            write_json(&store.users_path, &UsersDocument::default()).await?;
        }
        if !tokio::fs::try_exists(&store.reports_path).await? {
            write_json(&store.reports_path, &ReportsDocument::default()).await?;
        }

        tracing::debug!("📁 JSON store opened at {}", data_dir.display());
        Ok(store)
    }

    pub fn users_path(&self) -> &Path {
        &self.users_path
    }

    async fn update_users<T>(&self, f: impl FnOnce(&mut UsersDocument) -> T) -> Result<T> {
        let _guard = self.users_lock.lock().await;
        let mut doc: UsersDocument = read_json(&self.users_path).await?;
        let result = f(&mut doc);
        write_json(&self.users_path, &doc).await?;
        Ok(result)
    }

    async fn read_users(&self) -> Result<UsersDocument> {
        let _guard = self.users_lock.lock().await;
        read_json(&self.users_path).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read(path).await?;
    serde_json::from_slice(&content).map_err(|e| BotError::StoreError {
        message: format!("{} is not valid: {}", path.display(), e),
    })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &data).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[async_trait]
impl AccessStore for JsonFileStore {
    async fn get(&self, number: &str) -> Result<Option<AccessEntry>> {
        let doc = self.read_users().await?;
        Ok(doc.users.into_iter().find(|u| u.number == number))
    }

    async fn upsert(&self, entry: AccessEntry) -> Result<bool> {
        self.update_users(|doc| {
            match doc.users.iter().position(|u| u.number == entry.number) {
                Some(index) => {
                    doc.users[index] = entry;
                    true
                }
                None => {
                    doc.users.push(entry);
                    false
                }
            }
        })
        .await
    }

    async fn delete(&self, number: &str) -> Result<bool> {
        self.update_users(|doc| {
            let before = doc.users.len();
            doc.users.retain(|u| u.number != number);
            doc.users.len() != before
        })
        .await
    }

    async fn list(&self) -> Result<Vec<AccessEntry>> {
        Ok(self.read_users().await?.users)
    }

    async fn is_admin(&self, number: &str) -> Result<bool> {
        Ok(self.read_users().await?.admin.iter().any(|a| a == number))
    }
}

#[async_trait]
impl ReportStore for JsonFileStore {
    async fn append(&self, entry: ReportEntry) -> Result<()> {
        let _guard = self.reports_lock.lock().await;
        let mut doc: ReportsDocument = read_json(&self.reports_path).await?;
        doc.reports.push(entry);
        write_json(&self.reports_path, &doc).await
    }

    async fn list(&self) -> Result<Vec<ReportEntry>> {
        let _guard = self.reports_lock.lock().await;
        let doc: ReportsDocument = read_json(&self.reports_path).await?;
        Ok(doc.reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entry(number: &str, expired: (i32, u32, u32)) -> AccessEntry {
        AccessEntry {
            number: number.to_string(),
            created: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            expired: NaiveDate::from_ymd_opt(expired.0, expired.1, expired.2).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_open_creates_empty_files() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("data")).await.unwrap();

        let users: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.users_path()).unwrap()).unwrap();
        assert_eq!(users, serde_json::json!({"users": [], "admin": []}));
        assert!(ReportStore::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        assert!(!store.upsert(entry("628111", (2025, 2, 1))).await.unwrap());
        assert!(store.upsert(entry("628111", (2025, 3, 1))).await.unwrap());

        let found = store.get("628111").await.unwrap().unwrap();
        assert_eq!(found.expired, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(AccessStore::list(&store).await.unwrap().len(), 1);

        assert!(store.delete("628111").await.unwrap());
        assert!(!store.delete("628111").await.unwrap());
        assert!(store.get("628111").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reads_existing_users_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(USERS_FILE),
            r#"{"users":[{"number":"628111","created":"2025-01-01","expired":"2999-12-31"}],"admin":["628999"]}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(dir.path()).await.unwrap();
        assert!(store.is_admin("628999").await.unwrap());
        assert!(!store.is_admin("628111").await.unwrap());
        assert!(store.get("628111").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append(ReportEntry {
                        user: format!("user{}", i),
                        command: "blast".to_string(),
                        target: "nomor.txt".to_string(),
                        message: "hi".to_string(),
                        timestamp: "2025-01-01T00:00:00".to_string(),
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ReportStore::list(store.as_ref()).await.unwrap().len(), 20);
    }
}
