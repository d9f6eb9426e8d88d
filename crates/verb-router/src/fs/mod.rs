/// File-based routing
///
/// - `scanner`: walks the routes directory into a swappable route set
/// - `loader`: route modules and the loaders that produce them
/// - `router`: dispatch with lazily loaded, generation-checked modules
/// - `watcher`: hot reload on filesystem events

pub mod loader;
pub mod router;
pub mod scanner;
pub mod watcher;

pub use loader::{ModuleLoader, ModuleRegistry, RouteModule};
pub use router::{FileMatch, FilesystemRouter};
pub use scanner::{ChangeKind, FileRoute, RouteChange, RouteScanner, RouteSet};
pub use watcher::{apply_event, Reloadable, RouteWatcher};
