//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Prefix of environment variable overrides (`CHATLINE_BACKEND__BASE_URL`)
pub const ENV_PREFIX: &str = "CHATLINE_";

const PROJECT_FILES: [&str; 2] = ["chatline.toml", ".chatline.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. `CHATLINE_*` environment variables, nested with `__`
    /// 3. Project root: `./chatline.toml` or `./.chatline.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/chatline/config.toml`
    /// 5. Default values
    ///
    /// An explicit path that does not exist is an error; the discovered
    /// files are simply skipped when missing.
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        if let Some(path) = config_path
            && !path.is_file()
        {
            return Err(Box::new(figment::Error::from(format!(
                "config file not found: {}",
                path.display()
            ))));
        }

        Self::figment(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
            config_path.map(PathBuf::as_path),
        )
        .extract()
        .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(global: Option<&Path>, project: Option<&Path>, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(path) = global
            && path.exists()
        {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = project {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        // Explicit config path (highest priority)
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/chatline/config.toml if set,
    /// otherwise falls back to ~/.config/chatline/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("chatline").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(explicit: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "     " };
            println!("  [{}] Explicit: {}", mark, path.display());
        }

        println!("  [     ] Env:      {}* variables", ENV_PREFIX);

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project:  {}", path.display());
        } else {
            println!("  [     ] Project:  ./chatline.toml or ./.chatline.toml");
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            println!("  [{}] Global:   {}", mark, path.display());
        }

        println!("  [     ] Default:  built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.backend.base_url, "http://localhost:8000/api");
        assert!(config.output.color);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("chatline"));
    }

    #[test]
    fn test_explicit_file_overrides_project_and_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_toml(
            dir.path(),
            "global.toml",
            "[backend]\nbase_url = \"http://global/api\"\nchatbot_id = 1\n\n[output]\ncolor = false\n",
        );
        let project = write_toml(
            dir.path(),
            "project.toml",
            "[backend]\nbase_url = \"http://project/api\"\nchatbot_id = 2\n",
        );
        let explicit = write_toml(dir.path(), "explicit.toml", "[backend]\nchatbot_id = 3\n");

        let config: FileConfig = ConfigLoader::figment(
            Some(global.as_path()),
            Some(project.as_path()),
            Some(explicit.as_path()),
        )
        .extract()
        .unwrap();

        assert_eq!(config.backend.chatbot_id, Some(3));
        assert_eq!(config.backend.base_url, "http://project/api");
        assert!(!config.output.color);
        // Untouched sections keep their defaults
        assert_eq!(config.backend.timeout_secs, 10);
    }

    #[test]
    fn test_missing_global_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let config: FileConfig = ConfigLoader::figment(Some(missing.as_path()), None, None)
            .extract()
            .unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = ConfigLoader::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn test_existing_explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write_toml(dir.path(), "explicit.toml", "[backend]\nchatbot_id = 9\n");
        let config = ConfigLoader::load(Some(&explicit)).unwrap();
        assert_eq!(config.backend.chatbot_id, Some(9));
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write_toml(dir.path(), "bad.toml", "[backend]\ntimeout_secs = \"soon\"\n");
        let result =
            ConfigLoader::figment(None, None, Some(explicit.as_path())).extract::<FileConfig>();
        assert!(result.is_err());
    }
}
