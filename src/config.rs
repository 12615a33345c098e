//! Configuration handling for bmodel

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use buildmodel_core::BuildModelError;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "buildmodel.toml";

/// Extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildModelConfig {
    /// Build script file name
    #[serde(default = "default_build_file")]
    pub build_file: String,

    /// Settings script file name
    #[serde(default = "default_settings_file")]
    pub settings_file: String,

    /// Coordinate of the build plugin whose version selects the builder
    #[serde(default)]
    pub plugin: PluginConfig,

    /// Repository shorthands such as `mavenCentral()`
    #[serde(default = "default_repositories")]
    pub repositories: Vec<WellKnownRepository>,
}

/// Build plugin coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default = "default_plugin_group")]
    pub group: String,

    #[serde(default = "default_plugin_artifact")]
    pub artifact: String,
}

/// A repository declared with an argument-less call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellKnownRepository {
    /// Method name, e.g. `jcenter`
    pub method: String,

    /// Name shown to the user
    pub display_name: String,

    pub url: String,

    /// Help page identifier
    #[serde(default)]
    pub help_id: Option<String>,
}

fn default_build_file() -> String {
    "build.gradle".to_string()
}

fn default_settings_file() -> String {
    "settings.gradle".to_string()
}

fn default_plugin_group() -> String {
    "com.android.tools.build".to_string()
}

fn default_plugin_artifact() -> String {
    "gradle".to_string()
}

fn repository(method: &str, display_name: &str, url: &str, help_id: &str) -> WellKnownRepository {
    WellKnownRepository {
        method: method.to_string(),
        display_name: display_name.to_string(),
        url: url.to_string(),
        help_id: Some(help_id.to_string()),
    }
}

fn default_repositories() -> Vec<WellKnownRepository> {
    vec![
        repository(
            "mavenCentral",
            "Maven Central",
            "https://repo1.maven.org/maven2/",
            "repositories.maven-central",
        ),
        repository(
            "jcenter",
            "JCenter",
            "https://jcenter.bintray.com/",
            "repositories.jcenter",
        ),
        repository(
            "google",
            "Google",
            "https://maven.google.com/",
            "repositories.google",
        ),
        repository(
            "mavenLocal",
            "Maven Local",
            "file://~/.m2/repository",
            "repositories.maven-local",
        ),
    ]
}

impl Default for BuildModelConfig {
    fn default() -> Self {
        Self {
            build_file: default_build_file(),
            settings_file: default_settings_file(),
            plugin: PluginConfig::default(),
            repositories: default_repositories(),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            group: default_plugin_group(),
            artifact: default_plugin_artifact(),
        }
    }
}

impl PluginConfig {
    /// `group:artifact`
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }
}

impl BuildModelConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, BuildModelError> {
        let content = fs::read_to_string(path).map_err(|e| BuildModelError::Config {
            path: path.display().to_string(),
            message: format!("failed to read config file: {}", e),
        })?;
        toml::from_str(&content).map_err(|e| BuildModelError::Config {
            path: path.display().to_string(),
            message: format!("failed to parse config file: {}", e),
        })
    }

    /// Load `buildmodel.toml` from `dir` if present, otherwise the defaults
    pub fn load_from_dir(dir: &Path) -> Result<Self, BuildModelError> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            Self::load(&config_path)
        } else {
            Ok(BuildModelConfig::default())
        }
    }

    /// The shorthand repository declared by calling `method()`
    pub fn repository(&self, method: &str) -> Option<&WellKnownRepository> {
        self.repositories.iter().find(|r| r.method == method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = BuildModelConfig::default();
        assert_eq!(config.build_file, "build.gradle");
        assert_eq!(config.settings_file, "settings.gradle");
        assert_eq!(config.plugin.key(), "com.android.tools.build:gradle");
        assert_eq!(config.repository("jcenter").unwrap().display_name, "JCenter");
        assert!(config.repository("maven").is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: BuildModelConfig = toml::from_str(
            r#"
settings_file = "settings.gradle.kts"

[plugin]
group = "org.example"
"#,
        )
        .unwrap();
        assert_eq!(config.settings_file, "settings.gradle.kts");
        assert_eq!(config.build_file, "build.gradle");
        assert_eq!(config.plugin.group, "org.example");
        assert_eq!(config.plugin.artifact, "gradle");
        assert_eq!(config.repositories.len(), 4);
    }

    #[test]
    fn repositories_table_replaces_defaults() {
        let config: BuildModelConfig = toml::from_str(
            r#"
[[repositories]]
method = "corporate"
display_name = "Corporate"
url = "https://repo.example.com/"
"#,
        )
        .unwrap();
        assert_eq!(config.repositories.len(), 1);
        let repo = config.repository("corporate").unwrap();
        assert_eq!(repo.help_id, None);
        assert!(config.repository("jcenter").is_none());
    }

    #[test]
    fn load_from_dir_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = BuildModelConfig::load_from_dir(dir.path()).unwrap();
        assert_eq!(config, BuildModelConfig::default());
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "build_file = [").unwrap();
        let err = BuildModelConfig::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, BuildModelError::Config { .. }));
        assert!(err.to_string().contains("failed to parse config file"));
    }
}
