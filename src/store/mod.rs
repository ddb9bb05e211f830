use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use tokio::sync::oneshot;

mod state;

pub use state::{CacheEntry, StoreState, UserProfile, UserSettings};

type StorePatch = Box<dyn FnOnce(&mut StoreState) + Send + 'static>;

enum StoreCommand {
    Get(oneshot::Sender<StoreState>),
    Update(StorePatch, oneshot::Sender<Result<StoreState>>),
    Shutdown,
}

struct StoreInner {
    sender: mpsc::Sender<StoreCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(StoreCommand::Shutdown) {
                error!("Failed to send shutdown to store thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join store thread: {join_err:?}");
            }
        }
    }
}

fn load_document(path: &Path) -> StoreState {
    if !path.exists() {
        return StoreState::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    "Store document at {} is unreadable ({err}); starting from defaults",
                    path.display()
                );
                StoreState::default()
            }
        },
        Err(err) => {
            warn!(
                "Failed to read store document at {} ({err}); starting from defaults",
                path.display()
            );
            StoreState::default()
        }
    }
}

fn persist_document(path: &Path, state: &StoreState) -> Result<()> {
    let serialized = serde_json::to_string_pretty(state)?;
    std::fs::write(path, serialized)
        .with_context(|| format!("failed to write store document to {}", path.display()))
}

/// Handle to the shared extension store: one JSON document behind a worker
/// thread. Every mutation goes through the worker queue, so in-process
/// read-modify-write races cannot lose a patch. A second *process* writing
/// the same file still gets whole-document last-write-wins; that is the
/// store's documented consistency model, not something this handle hides.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
    doc_path: Arc<PathBuf>,
}

impl Store {
    pub fn open(doc_path: PathBuf) -> Result<Self> {
        if let Some(parent) = doc_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create store directory {}", parent.display()))?;
        }

        let (command_tx, command_rx) = mpsc::channel::<StoreCommand>();
        let path_for_thread = doc_path.clone();

        let worker = thread::Builder::new()
            .name("biascope-store".into())
            .spawn(move || {
                let mut document = load_document(&path_for_thread);

                while let Ok(command) = command_rx.recv() {
                    match command {
                        StoreCommand::Get(reply) => {
                            if reply.send(document.clone()).is_err() {
                                error!("Store caller dropped before receiving document");
                            }
                        }
                        StoreCommand::Update(patch, reply) => {
                            patch(&mut document);
                            let result =
                                persist_document(&path_for_thread, &document).map(|_| document.clone());
                            if reply.send(result).is_err() {
                                error!("Store caller dropped before receiving update result");
                            }
                        }
                        StoreCommand::Shutdown => break,
                    }
                }

                info!("Store thread shutting down");
            })
            .with_context(|| "failed to spawn store worker thread")?;

        info!("Store opened at {}", doc_path.display());

        Ok(Self {
            inner: Arc::new(StoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            doc_path: Arc::new(doc_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.doc_path.as_path()
    }

    /// Current document. Read-only; no file access involved.
    pub async fn get(&self) -> Result<StoreState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner
            .sender
            .send(StoreCommand::Get(reply_tx))
            .map_err(|err| anyhow!("failed to send get to store thread: {err}"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("store thread terminated unexpectedly"))
    }

    /// Apply a patch to the document and persist the whole document.
    /// Returns the post-patch state.
    pub async fn update<F>(&self, patch: F) -> Result<StoreState>
    where
        F: FnOnce(&mut StoreState) + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner
            .sender
            .send(StoreCommand::Update(Box::new(patch), reply_tx))
            .map_err(|err| anyhow!("failed to send update to store thread: {err}"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("store thread terminated unexpectedly"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path().join("store.json")).expect("open store");
        (dir, store)
    }

    #[tokio::test]
    async fn missing_document_starts_from_defaults() {
        let (_dir, store) = temp_store();
        let state = store.get().await.unwrap();
        assert!(state.user_profile.onboarding_completed_at.is_none());
        assert!(state.settings.analysis_enabled);
        assert!(state.llm_analysis_cache.is_empty());
    }

    #[tokio::test]
    async fn update_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = Store::open(path.clone()).unwrap();
            store
                .update(|state| {
                    state.user_profile.primary_goal = "reduce_biases".into();
                    state.user_profile.onboarding_completed_at = Some(Utc::now());
                })
                .await
                .unwrap();
        }

        let store = Store::open(path).unwrap();
        let state = store.get().await.unwrap();
        assert_eq!(state.user_profile.primary_goal, "reduce_biases");
        assert!(state.user_profile.onboarding_completed_at.is_some());
    }

    #[tokio::test]
    async fn racing_updates_both_land() {
        let (_dir, store) = temp_store();

        let a = store.clone();
        let b = store.clone();
        let (ra, rb) = tokio::join!(
            a.update(|state| {
                state.user_profile.primary_goal = "think_clearly".into();
            }),
            b.update(|state| {
                state.settings.analysis_enabled = false;
            }),
        );
        ra.unwrap();
        rb.unwrap();

        // The worker queue serializes patches, so neither overwrites the other.
        let state = store.get().await.unwrap();
        assert_eq!(state.user_profile.primary_goal, "think_clearly");
        assert!(!state.settings.analysis_enabled);
    }

    #[tokio::test]
    async fn corrupt_document_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = Store::open(path).unwrap();
        let state = store.get().await.unwrap();
        assert!(state.llm_analysis_cache.is_empty());
    }

    #[tokio::test]
    async fn foreign_fields_survive_a_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"gamification": {"points": 42}, "settings": {"analysisEnabled": true}}"#,
        )
        .unwrap();

        let store = Store::open(path.clone()).unwrap();
        store
            .update(|state| {
                state.user_profile.primary_goal = "g".into();
            })
            .await
            .unwrap();
        drop(store);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["gamification"]["points"], 42);
    }
}
