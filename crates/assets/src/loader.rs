use std::panic;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use hopscene_kernel::{Scene, SceneConfig};

use crate::{AssetError, AssetStore, ImportedModel, ModelRole, import_model};

/// Completion of one load request.
#[derive(Debug)]
pub struct LoadEvent {
    pub role: ModelRole,
    pub path: PathBuf,
    pub result: Result<ImportedModel, AssetError>,
}

impl LoadEvent {
    /// Register a finished import and place it in its scene slot using the
    /// matching placement from `config`.
    ///
    /// A failed load leaves the scene untouched and hands the error back.
    pub fn deliver(
        self,
        scene: &mut Scene,
        store: &mut AssetStore,
        config: &SceneConfig,
    ) -> Result<(), AssetError> {
        let model = self.result?;
        store.register_model(&model);
        let placed = match self.role {
            ModelRole::Structure => model.place(&config.structure),
            ModelRole::Character => model.place(&config.character),
        };
        tracing::info!(
            path = %self.path.display(),
            role = ?self.role,
            mesh = %placed.name,
            "model placed"
        );
        match self.role {
            ModelRole::Structure => scene.place_structure(placed),
            ModelRole::Character => scene.place_character(placed),
        }
        Ok(())
    }
}

/// Runs model imports off the frame loop.
///
/// Each request gets its own worker thread. Results queue up in a channel
/// and reach the caller only through [`AssetLoader::poll`], so the scene is
/// always mutated on the thread that owns the loader.
pub struct AssetLoader {
    tx: Sender<LoadEvent>,
    rx: Receiver<LoadEvent>,
    in_flight: usize,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Start importing `path` for `role`.
    pub fn request(&mut self, role: ModelRole, path: impl Into<PathBuf>) {
        let path = path.into();
        let tx = self.tx.clone();
        let worker_path = path.clone();
        tracing::debug!(path = %path.display(), ?role, "load requested");

        let spawned = thread::Builder::new()
            .name(format!("asset-load-{role:?}").to_lowercase())
            .spawn(move || {
                // A panicking import still reports back, so `in_flight` drains.
                let result = panic::catch_unwind(|| import_model(&worker_path, role))
                    .unwrap_or_else(|_| {
                        Err(AssetError::GltfParse(format!(
                            "import of {} panicked",
                            worker_path.display()
                        )))
                    });
                // Receiver gone means the loader was dropped; nobody is waiting.
                let _ = tx.send(LoadEvent {
                    role,
                    path: worker_path,
                    result,
                });
            });

        self.in_flight += 1;
        if let Err(e) = spawned {
            let _ = self.tx.send(LoadEvent {
                role,
                path,
                result: Err(AssetError::Io(e)),
            });
        }
    }

    /// Number of requests whose result has not been polled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Take every finished load without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let events: Vec<LoadEvent> = self.rx.try_iter().collect();
        self.in_flight -= events.len();
        events
    }

    /// Block until every outstanding request has finished or `timeout` passes.
    pub fn wait_all(&mut self, timeout: Duration) -> Vec<LoadEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(event) => {
                    self.in_flight -= 1;
                    events.push(event);
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(pending = self.in_flight, "asset loads timed out");
                    break;
                }
                // Unreachable while `self.tx` is alive.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        events
    }
}
