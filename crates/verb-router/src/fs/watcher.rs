use anyhow::{anyhow, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

use super::router::FilesystemRouter;
use super::scanner::RouteChange;
use crate::facade::UniversalRouter;

/// Something hot reload can drive: a filesystem router, or a facade that may
/// hold one.
pub trait Reloadable: Send + Sync + 'static {
    fn filesystem(&self) -> Option<&FilesystemRouter>;
}

impl Reloadable for FilesystemRouter {
    fn filesystem(&self) -> Option<&FilesystemRouter> {
        Some(self)
    }
}

impl Reloadable for UniversalRouter {
    fn filesystem(&self) -> Option<&FilesystemRouter> {
        self.as_filesystem()
    }
}

/// Hot reload for a [`FilesystemRouter`]
///
/// Watches the routes directory recursively and applies every change to the
/// router as it happens. Applied changes are broadcast to subscribers.
/// Dropping the watcher stops watching.
pub struct RouteWatcher {
    tx: broadcast::Sender<RouteChange>,
    _watcher: notify::RecommendedWatcher,
}

impl RouteWatcher {
    /// Start watching the router's routes directory
    ///
    /// Fails for routers without a routes directory.
    pub fn new<R: Reloadable>(router: Arc<R>) -> Result<Self> {
        let root = router
            .filesystem()
            .ok_or_else(|| anyhow!("hot reload requires the filesystem router"))?
            .root()
            .to_path_buf();
        let (tx, _) = broadcast::channel(100);
        let tx_clone = tx.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let Some(router) = router.filesystem() else {
                        return;
                    };
                    for change in apply_event(router, &event) {
                        // Broadcast change event (ignore if no receivers)
                        let _ = tx_clone.send(change);
                    }
                }
                Err(e) => error!("Watch error: {:?}", e),
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!("Watching routes in {:?}", root);

        Ok(Self {
            tx,
            _watcher: watcher,
        })
    }

    /// Subscribe to applied route changes
    pub fn subscribe(&self) -> broadcast::Receiver<RouteChange> {
        self.tx.subscribe()
    }
}

/// Applies one filesystem event to the router.
///
/// Files are reloaded individually. Directory events (a folder renamed,
/// created with content, or deleted) can affect many routes at once and
/// trigger a full rescan.
pub fn apply_event(router: &FilesystemRouter, event: &Event) -> Vec<RouteChange> {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return Vec::new();
    }

    let mut changes = Vec::new();
    for path in &event.paths {
        if is_directory_event(router, &event.kind, path) {
            info!("Routes directory changed at {:?}, rescanning", path);
            changes.push(router.rescan());
            break;
        }
        if let Some(change) = router.reload_route(path) {
            info!("Route file changed: {:?} ({:?})", path, change.kind);
            changes.push(change);
        }
    }
    changes
}

fn is_directory_event(router: &FilesystemRouter, kind: &EventKind, path: &Path) -> bool {
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => true,
        // Removed entries cannot be inspected; route files always carry an extension.
        EventKind::Remove(_) => path.extension().is_none(),
        // A folder moved out of the tree only reports its old, vanished path.
        EventKind::Modify(ModifyKind::Name(_)) => {
            path.is_dir()
                || (path.extension().is_none() && !router.scanner().is_route_source(path))
        }
        _ => path.is_dir(),
    }
}
