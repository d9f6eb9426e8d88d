// File: src/config.rs
// Purpose: Configuration parsing from verb.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RouterError;
use crate::route::ParameterSyntax;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub dev: DevConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// Which router serves requests
///
/// ```toml
/// [router]
/// type = "filesystem"
/// root_directory = "routes"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RouterConfig {
    /// Routes registered in code
    #[default]
    Manual,
    /// Routes discovered from a directory tree
    Filesystem(FilesystemOptions),
}

/// Filesystem router options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemOptions {
    /// Directory scanned for route files (default: "routes")
    #[serde(default = "default_root_directory")]
    pub root_directory: PathBuf,

    /// Extensions recognized as route files, with or without the leading dot
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,

    /// File stem that maps to its directory's path (default: "index")
    #[serde(default = "default_index_file_name")]
    pub index_file_name: String,

    /// How dynamic segments are spelled in file names (default: brackets)
    #[serde(default)]
    pub parameter_syntax: ParameterSyntax,
}

/// Development configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// Watch the routes directory and reload changed files
    #[serde(default = "default_true")]
    pub hot_reload: bool,

    /// Include error details in 500 responses
    #[serde(default = "default_false")]
    pub development: bool,
}

// Default values
fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_root_directory() -> PathBuf {
    PathBuf::from("routes")
}

fn default_file_extensions() -> Vec<String> {
    ["ts", "tsx", "js", "jsx", "rs"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_index_file_name() -> String {
    "index".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for FilesystemOptions {
    fn default() -> Self {
        Self {
            root_directory: default_root_directory(),
            file_extensions: default_file_extensions(),
            index_file_name: default_index_file_name(),
            parameter_syntax: ParameterSyntax::default(),
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            hot_reload: true,
            development: false,
        }
    }
}

impl ServerConfig {
    /// `host:port`, ready for a listener
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FilesystemOptions {
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            ..Self::default()
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_index_file_name(mut self, name: impl Into<String>) -> Self {
        self.index_file_name = name.into();
        self
    }

    pub fn with_parameter_syntax(mut self, syntax: ParameterSyntax) -> Self {
        self.parameter_syntax = syntax;
        self
    }

    /// Rejects options a filesystem router cannot start with.
    pub fn validate(&self) -> Result<(), RouterError> {
        let root = &self.root_directory;
        if !root.exists() {
            return Err(RouterError::Configuration(format!(
                "routes directory {:?} does not exist",
                root
            )));
        }
        if !root.is_dir() {
            return Err(RouterError::Configuration(format!(
                "routes directory {:?} is not a directory",
                root
            )));
        }
        if self.extensions().next().is_none() {
            return Err(RouterError::Configuration(
                "at least one route file extension is required".to_string(),
            ));
        }
        if self.index_file_name.trim().is_empty() {
            return Err(RouterError::Configuration(
                "index file name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `path` carries one of the configured extensions.
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions().any(|known| known == ext))
            .unwrap_or(false)
    }

    fn extensions(&self) -> impl Iterator<Item = &str> {
        self.file_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
    }
}

impl Config {
    /// Load configuration from verb.toml
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./verb.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("verb.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.addr(), "127.0.0.1:3000");
        assert_eq!(config.router, RouterConfig::Manual);
        assert!(config.dev.hot_reload);
        assert!(!config.dev.development);
    }

    #[test]
    fn test_filesystem_router_config() {
        let toml = r#"
            [server]
            port = 8080

            [router]
            type = "filesystem"
            root_directory = "app/routes"
            file_extensions = [".rs"]
            parameter_syntax = "colon"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);

        let RouterConfig::Filesystem(options) = config.router else {
            panic!("expected filesystem router config");
        };
        assert_eq!(options.root_directory, PathBuf::from("app/routes"));
        assert_eq!(options.index_file_name, "index");
        assert_eq!(options.parameter_syntax, ParameterSyntax::Colon);
        assert!(options.matches_extension(Path::new("users/[id].rs")));
        assert!(!options.matches_extension(Path::new("users/[id].ts")));
    }

    #[test]
    fn test_unknown_router_type_fails_to_parse() {
        let toml = r#"
            [router]
            type = "magic"
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_load_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Config::load(dir.path().join("verb.toml")).unwrap();
        assert_eq!(missing.server.port, 3000);

        let empty = dir.path().join("empty.toml");
        fs::write(&empty, "  \n").unwrap();
        assert_eq!(Config::load(&empty).unwrap().router, RouterConfig::Manual);

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[server\nport = ").unwrap();
        assert!(Config::load(&broken).is_err());
    }

    #[test]
    fn test_validate_filesystem_options() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FilesystemOptions::new(dir.path()).validate().is_ok());

        let missing = FilesystemOptions::new(dir.path().join("nope"));
        assert!(matches!(missing.validate(), Err(RouterError::Configuration(_))));

        let file = dir.path().join("file.txt");
        fs::write(&file, "").unwrap();
        assert!(FilesystemOptions::new(&file).validate().is_err());

        let no_ext = FilesystemOptions::new(dir.path()).with_extensions(Vec::<String>::new());
        assert!(no_ext.validate().is_err());

        let no_index = FilesystemOptions::new(dir.path()).with_index_file_name(" ");
        assert!(no_index.validate().is_err());
    }
}
