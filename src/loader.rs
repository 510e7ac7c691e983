//! Asynchronous asset loading with a tagged three-way outcome.
//!
//! A load produces any number of [`LoadEvent::Progress`] events followed by
//! exactly one terminal [`LoadEvent::Success`] or [`LoadEvent::Failure`].
//! The events are handed to a sink (usually a closure forwarding them to the
//! winit event loop) and [`AssetLoad`] turns them into at most one loaded
//! asset on the event loop thread.
//!
//! # Example
//!
//! ```
//! use globe_scene::loader::{AssetLoad, LoadEvent, LoadStatus};
//!
//! let mut load = AssetLoad::new("models/earth/scene.gltf");
//! assert_eq!(load.handle(LoadEvent::Success(7)), Some(7));
//! assert_eq!(load.handle(LoadEvent::Success(8)), None);
//! assert_eq!(load.status(), LoadStatus::Loaded);
//! ```

use futures::{
    StreamExt,
    channel::mpsc::{self, UnboundedSender},
};

use crate::resources::ModelData;

/// One fetched file of a multi-file asset.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadProgress {
    /// The asset being loaded.
    pub path: String,
    /// The file that was just fetched.
    pub file: String,
    pub bytes: usize,
    pub loaded_files: usize,
    pub total_files: usize,
}

#[derive(Debug)]
pub enum LoadEvent<T = ModelData> {
    Progress(LoadProgress),
    Success(T),
    Failure(anyhow::Error),
}

impl<T> LoadEvent<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadEvent::Progress(_) => "progress",
            LoadEvent::Success(_) => "success",
            LoadEvent::Failure(_) => "failure",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadEvent::Progress(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Loaded,
    Failed,
}

/// Tracks one asset load on the consuming side.
#[derive(Debug)]
pub struct AssetLoad {
    path: String,
    status: LoadStatus,
    progress_events: usize,
}

impl AssetLoad {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: LoadStatus::Pending,
            progress_events: 0,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn progress_events(&self) -> usize {
        self.progress_events
    }

    /// Consume one load event.
    ///
    /// Returns the asset the first time a success arrives while the load is
    /// still pending. Progress and failures are only logged; anything arriving
    /// after a terminal outcome is ignored.
    pub fn handle<T>(&mut self, event: LoadEvent<T>) -> Option<T> {
        if self.status != LoadStatus::Pending {
            log::warn!(
                "Ignoring {} event for {}: load already {:?}",
                event.kind(),
                self.path,
                self.status
            );
            return None;
        }
        match event {
            LoadEvent::Progress(progress) => {
                self.progress_events += 1;
                log::info!(
                    "Loading {}: {}/{} files ({} bytes from {})",
                    self.path,
                    progress.loaded_files,
                    progress.total_files,
                    progress.bytes,
                    progress.file
                );
                None
            }
            LoadEvent::Success(asset) => {
                self.status = LoadStatus::Loaded;
                log::info!("Loaded {}", self.path);
                Some(asset)
            }
            LoadEvent::Failure(e) => {
                self.status = LoadStatus::Failed;
                log::error!("Failed to load {}: {:#}", self.path, e);
                None
            }
        }
    }
}

/// Run `load` and feed everything it reports into `sink`.
///
/// Progress events are forwarded while the load runs; the terminal event is
/// always the last one the sink sees. The sink is handed back afterwards.
pub async fn drive_load<T, L, Fut, F>(load: L, sink: F) -> F
where
    L: FnOnce(UnboundedSender<LoadProgress>) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
    F: Fn(LoadEvent<T>),
{
    let (tx, mut rx) = mpsc::unbounded();
    let forward = async move {
        while let Some(progress) = rx.next().await {
            sink(LoadEvent::Progress(progress));
        }
        sink
    };
    let (result, sink) = futures::join!(load(tx), forward);
    match result {
        Ok(asset) => sink(LoadEvent::Success(asset)),
        Err(e) => sink(LoadEvent::Failure(e)),
    }
    sink
}

/// Start loading the glTF at `path` in the background.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_load<F>(runtime: &tokio::runtime::Runtime, path: String, sink: F)
where
    F: Fn(LoadEvent) + Send + 'static,
{
    log::info!("Loading {path}");
    runtime.spawn(drive_load(
        move |tx| async move { crate::resources::load_model_gltf(&path, tx).await },
        sink,
    ));
}

/// Start loading the glTF at `path` in the background.
#[cfg(target_arch = "wasm32")]
pub fn spawn_load<F>(path: String, sink: F)
where
    F: Fn(LoadEvent) + 'static,
{
    log::info!("Loading {path}");
    wasm_bindgen_futures::spawn_local(async move {
        drive_load(
            move |tx| async move { crate::resources::load_model_gltf(&path, tx).await },
            sink,
        )
        .await;
    });
}
