//! Route discovery from a directory tree.
//!
//! The scanner owns an immutable [`RouteSet`] snapshot behind an [`ArcSwap`].
//! Matching reads the current snapshot without locking; every mutation builds
//! a new snapshot and swaps it in, bumping the generation counter. Writers are
//! serialized so concurrent reloads cannot lose each other's updates.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use arc_swap::ArcSwap;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::FilesystemOptions;
use crate::error::Result;
use crate::handler::Params;
use crate::route::{parse_file_path, Pattern};
use crate::tree::RadixNode;

/// One discovered route file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRoute {
    pub pattern: Pattern,
    /// Parameter names, in pattern order
    pub params: Vec<String>,
    /// Absolute location of the route file
    pub source: PathBuf,
    /// Location relative to the routes directory
    pub relative: PathBuf,
    pub modified: SystemTime,
    /// Generation at which this entry was last (re)scanned
    pub generation: u64,
}

impl FileRoute {
    /// Relative location with forward slashes, e.g. `users/[id]/index.ts`.
    pub fn key(&self) -> String {
        relative_key(&self.relative)
    }
}

/// What a mutation did to the route set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
    Rescanned,
}

/// Broadcast to hot reload subscribers after every applied mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub kind: ChangeKind,
    pub path: PathBuf,
    /// Affected pattern; `None` for a full rescan
    pub pattern: Option<String>,
    pub generation: u64,
}

/// Immutable snapshot of the discovered routes.
///
/// Every routable file is kept, including files shadowed by a collision, so
/// a reload can hand a pattern to the right file without walking the tree.
#[derive(Debug, Default)]
pub struct RouteSet {
    routes: HashMap<String, Arc<FileRoute>>,
    files: HashMap<PathBuf, Arc<FileRoute>>,
    table: RadixNode<String>,
    generation: u64,
}

impl RouteSet {
    fn build(files: HashMap<PathBuf, Arc<FileRoute>>, generation: u64) -> Self {
        let mut routes: HashMap<String, Arc<FileRoute>> = HashMap::with_capacity(files.len());
        for route in files.values() {
            let key = route.pattern.to_string();
            let shadowed = routes
                .get(&key)
                .is_some_and(|current| discovery_order(route, current) == Ordering::Less);
            if !shadowed {
                routes.insert(key, Arc::clone(route));
            }
        }

        let mut table = RadixNode::new();
        for (key, route) in &routes {
            *table.insert_with(&route.pattern, String::new) = key.clone();
        }
        Self {
            routes,
            files,
            table,
            generation,
        }
    }

    /// Files deriving `pattern`, in discovery order. The last one serves it.
    fn claimants(&self, pattern: &str) -> Vec<&Arc<FileRoute>> {
        let mut claimants: Vec<&Arc<FileRoute>> = self
            .files
            .values()
            .filter(|route| route.pattern.as_str() == pattern)
            .collect();
        claimants.sort_by(|a, b| discovery_order(a, b));
        claimants
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, pattern: &str) -> Option<&Arc<FileRoute>> {
        self.routes.get(pattern)
    }

    /// Matches a request path with the same specificity rules as the
    /// programmatic router.
    pub fn find(&self, path: &str) -> Option<(Arc<FileRoute>, Params)> {
        let found = self.table.lookup(path)?;
        let route = self.routes.get(found.value)?;
        let params = Params::from_captures(&route.params, found.captures);
        Some((Arc::clone(route), params))
    }
}

/// Discovers route files and keeps the route set current.
pub struct RouteScanner {
    options: FilesystemOptions,
    state: ArcSwap<RouteSet>,
    writer: Mutex<()>,
}

impl RouteScanner {
    /// Validates `options` and performs the initial scan.
    pub fn new(options: FilesystemOptions) -> Result<Self> {
        options.validate()?;

        let mut options = options;
        options.root_directory = std::fs::canonicalize(&options.root_directory)?;

        let scanner = Self {
            options,
            state: ArcSwap::from_pointee(RouteSet::default()),
            writer: Mutex::new(()),
        };
        scanner.scan();
        Ok(scanner)
    }

    pub fn options(&self) -> &FilesystemOptions {
        &self.options
    }

    /// Canonical routes directory.
    pub fn root(&self) -> &Path {
        &self.options.root_directory
    }

    pub fn snapshot(&self) -> Arc<RouteSet> {
        self.state.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.state.load().generation
    }

    /// Discovered routes, sorted by pattern.
    pub fn routes(&self) -> Vec<FileRoute> {
        let snapshot = self.state.load();
        let mut routes: Vec<FileRoute> = snapshot.routes.values().map(|r| (**r).clone()).collect();
        routes.sort_by(|a, b| a.pattern.as_str().cmp(b.pattern.as_str()));
        routes
    }

    pub fn find(&self, path: &str) -> Option<(Arc<FileRoute>, Params)> {
        self.state.load().find(path)
    }

    /// Replaces the route set with a fresh walk of the routes directory.
    pub fn scan(&self) -> RouteChange {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.state.load().generation + 1;
        let root = self.root();

        let mut files: HashMap<PathBuf, Arc<FileRoute>> = HashMap::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_private(entry.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry under {:?}: {}", root, err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(route) = self.examine(entry.path(), generation) {
                files.insert(route.source.clone(), Arc::new(route));
            }
        }

        let set = RouteSet::build(files, generation);
        let mut patterns: Vec<&String> = set.routes.keys().collect();
        patterns.sort();
        for pattern in patterns {
            report_collision(&set, pattern);
        }

        info!(
            "Discovered {} route(s) in {:?} (generation {})",
            set.len(),
            root,
            generation
        );
        self.state.store(Arc::new(set));

        RouteChange {
            kind: ChangeKind::Rescanned,
            path: root.to_path_buf(),
            pattern: None,
            generation,
        }
    }

    /// Re-examines a single file location.
    ///
    /// Relative paths are resolved against the routes directory. Returns
    /// `None` when the location is not, and was not, a route. When several
    /// files derive the same pattern, the one a full scan would pick serves
    /// it, so removing the winner hands the route to the next claimant.
    pub fn reload_route(&self, path: impl AsRef<Path>) -> Option<RouteChange> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let source = self.resolve(path.as_ref());
        let current = self.state.load_full();
        let generation = current.generation + 1;

        let previous = current.files.get(&source).cloned();
        let examined = if source.is_file() {
            self.examine(&source, generation)
        } else {
            None
        };

        let (kind, pattern) = match (&examined, &previous) {
            (Some(route), Some(_)) => (ChangeKind::Updated, route.pattern.to_string()),
            (Some(route), None) => (ChangeKind::Added, route.pattern.to_string()),
            (None, Some(route)) => (ChangeKind::Removed, route.pattern.to_string()),
            (None, None) => {
                debug!("Ignoring change to non-route file {:?}", source);
                return None;
            }
        };
        let serving = current.routes.get(&pattern).map(|route| route.source.clone());

        let mut files = current.files.clone();
        files.remove(&source);
        if let Some(route) = examined {
            files.insert(source.clone(), Arc::new(route));
        }

        // A file taking a pattern over from another one gets a fresh stamp.
        let winner = files
            .values()
            .filter(|route| route.pattern.as_str() == pattern)
            .max_by(|a, b| discovery_order(a, b))
            .cloned();
        if let Some(winner) = winner {
            if winner.source != source && Some(&winner.source) != serving.as_ref() {
                debug!("{:?} now serves {}", winner.relative, pattern);
                let promoted = FileRoute {
                    generation,
                    ..(*winner).clone()
                };
                files.insert(winner.source.clone(), Arc::new(promoted));
            }
        }

        let set = RouteSet::build(files, generation);
        report_collision(&set, &pattern);

        info!("Route {} {:?} from {:?}", pattern, kind, source);
        self.state.store(Arc::new(set));

        Some(RouteChange {
            kind,
            path: source,
            pattern: Some(pattern),
            generation,
        })
    }

    /// Whether `path` is a routable file in the current snapshot, shadowed or
    /// not.
    pub fn is_route_source(&self, path: impl AsRef<Path>) -> bool {
        let source = self.resolve(path.as_ref());
        self.state.load().files.contains_key(&source)
    }

    /// Drops every route. The next [`scan`](Self::scan) repopulates the set.
    pub fn clear(&self) -> u64 {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.state.load().generation + 1;
        self.state.store(Arc::new(RouteSet {
            generation,
            ..RouteSet::default()
        }));
        info!("Cleared routes (generation {})", generation);
        generation
    }

    /// Absolute, canonical form of `path`. Vanished files are resolved
    /// through their parent directory.
    fn resolve(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        };
        if let Ok(canonical) = std::fs::canonicalize(&joined) {
            return canonical;
        }
        match (joined.parent(), joined.file_name()) {
            (Some(parent), Some(name)) => std::fs::canonicalize(parent)
                .map(|parent| parent.join(name))
                .unwrap_or(joined),
            _ => joined,
        }
    }

    /// Builds the route for `source`, or `None` when the file is not routable.
    fn examine(&self, source: &Path, generation: u64) -> Option<FileRoute> {
        if !self.options.matches_extension(source) {
            return None;
        }

        let relative = source.strip_prefix(self.root()).ok()?;
        let private = relative.components().any(|c| match c {
            Component::Normal(name) => is_private(name),
            _ => true,
        });
        if private {
            return None;
        }

        let Some(stem) = relative.with_extension("").to_str().map(str::to_string) else {
            warn!("Skipping route file with a non UTF-8 name: {:?}", source);
            return None;
        };

        let pattern = match parse_file_path(
            &stem,
            &self.options.index_file_name,
            self.options.parameter_syntax,
        ) {
            Ok(pattern) => pattern,
            Err(err) => {
                warn!("Skipping route file {:?}: {}", source, err);
                return None;
            }
        };

        let modified = match std::fs::metadata(source).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(err) => {
                debug!("Cannot stat {:?}: {}", source, err);
                return None;
            }
        };

        Some(FileRoute {
            params: pattern.param_names(),
            pattern,
            source: source.to_path_buf(),
            relative: relative.to_path_buf(),
            modified,
            generation,
        })
    }
}

/// Order in which a scan discovers two files: walkdir visits siblings by
/// file name and a directory's contents right after the directory itself.
fn discovery_order(a: &FileRoute, b: &FileRoute) -> Ordering {
    a.relative.components().cmp(b.relative.components())
}

fn report_collision(set: &RouteSet, pattern: &str) {
    let claimants = set.claimants(pattern);
    if let Some((winner, shadowed)) = claimants.split_last() {
        for loser in shadowed {
            warn!(
                "Route collision on {}: {:?} overrides {:?}",
                pattern, winner.relative, loser.relative
            );
        }
    }
}

/// `_partials` and `.hidden` entries never become routes.
fn is_private(name: &OsStr) -> bool {
    name.to_str()
        .map(|n| n.starts_with('_') || n.starts_with('.'))
        .unwrap_or(false)
}

pub(crate) fn relative_key(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
