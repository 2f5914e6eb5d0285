//! Configuration management for Polyglot.
//!
//! Parses `polyglot.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Example
//!
//! ```toml
//! [site]
//! source_dir = "site"
//! template_dir = "templates"
//! resource_dir = "resource"
//! output_dir = "generated_site"
//! languages = ["en", "pl"]
//!
//! [names.example]
//! pl = "przykład"
//!
//! [directives]
//! language_attribute = "languagesite"
//! ```
//!
//! ## Environment Variable Expansion
//!
//! The four directory settings support `${VAR}` and `${VAR:-default}`.

mod expand;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override source document directory.
    pub source_dir: Option<PathBuf>,
    /// Override template directory.
    pub template_dir: Option<PathBuf>,
    /// Override resource directory.
    pub resource_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override configured languages.
    pub languages: Option<Vec<String>>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "polyglot.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site layout (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Localized path segment names: segment → language → name.
    pub names: HashMap<String, HashMap<String, String>>,
    /// Directive vocabulary.
    pub directives: DirectivesConfig,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw site configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    source_dir: Option<String>,
    template_dir: Option<String>,
    resource_dir: Option<String>,
    output_dir: Option<String>,
    languages: Option<Vec<String>>,
}

/// Resolved site configuration with absolute paths.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Directory holding source documents.
    pub source_dir: PathBuf,
    /// Directory holding templates. Template locations may not leave it.
    pub template_dir: PathBuf,
    /// Directory copied verbatim into the output.
    pub resource_dir: PathBuf,
    /// Directory receiving generated files. Recreated on every build.
    pub output_dir: PathBuf,
    /// Output languages, in configured order.
    pub languages: Vec<String>,
}

/// Element and attribute names of the markup directives.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DirectivesConfig {
    /// Template invocation element.
    pub invocation: String,
    /// Body slot element.
    pub body_slot: String,
    /// Variable slot element.
    pub variable_slot: String,
    /// Invocation attribute holding the template location.
    pub location_attribute: String,
    /// Variable slot attribute holding the variable name.
    pub name_attribute: String,
    /// Attribute restricting an element to one language.
    pub language_attribute: String,
}

impl Default for DirectivesConfig {
    fn default() -> Self {
        Self {
            invocation: "template-invocation".to_owned(),
            body_slot: "template-body-slot".to_owned(),
            variable_slot: "template-variable-slot".to_owned(),
            location_attribute: "location".to_owned(),
            name_attribute: "name".to_owned(),
            language_attribute: "languagesite".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.output_dir`").
        field: String,
        /// Error message (e.g., "${`OUT_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `polyglot.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated once more after the overrides.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let site = &mut self.site_resolved;
        if let Some(source_dir) = &settings.source_dir {
            site.source_dir.clone_from(source_dir);
        }
        if let Some(template_dir) = &settings.template_dir {
            site.template_dir.clone_from(template_dir);
        }
        if let Some(resource_dir) = &settings.resource_dir {
            site.resource_dir.clone_from(resource_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            site.output_dir.clone_from(output_dir);
        }
        if let Some(languages) = &settings.languages {
            site.languages.clone_from(languages);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            site: SiteConfigRaw::default(),
            names: HashMap::new(),
            directives: DirectivesConfig::default(),
            site_resolved: SiteConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_languages()?;
        self.validate_names()?;
        self.validate_directives()?;
        Ok(())
    }

    /// Validate the language list.
    fn validate_languages(&self) -> Result<(), ConfigError> {
        let languages = &self.site_resolved.languages;
        if languages.is_empty() {
            return Err(ConfigError::Validation(
                "site.languages must name at least one language".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for language in languages {
            require_non_empty(language, "site.languages entry")?;
            // Codes become path segments and appear inside `$PATH[..]$` tokens.
            if let Some(c) = language
                .chars()
                .find(|c| matches!(c, '/' | '\\' | '$' | '[' | ']'))
            {
                return Err(ConfigError::Validation(format!(
                    "site.languages entry '{language}' contains '{c}'"
                )));
            }
            if matches!(language.as_str(), "." | "..") {
                return Err(ConfigError::Validation(format!(
                    "site.languages entry '{language}' is not a valid folder name"
                )));
            }
            if !seen.insert(language.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "site.languages lists '{language}' more than once"
                )));
            }
        }

        Ok(())
    }

    /// Validate the site-name table. Names replace single path segments.
    fn validate_names(&self) -> Result<(), ConfigError> {
        for (segment, by_lang) in &self.names {
            for (lang, name) in by_lang {
                let field = format!("names.{segment}.{lang}");
                require_non_empty(name, &field)?;
                if matches!(name.as_str(), "." | "..") || name.contains(['/', '\\']) {
                    return Err(ConfigError::Validation(format!(
                        "{field} = '{name}' must be a single folder or file name"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate directive names.
    fn validate_directives(&self) -> Result<(), ConfigError> {
        let d = &self.directives;
        require_non_empty(&d.invocation, "directives.invocation")?;
        require_non_empty(&d.body_slot, "directives.body_slot")?;
        require_non_empty(&d.variable_slot, "directives.variable_slot")?;
        require_non_empty(&d.location_attribute, "directives.location_attribute")?;
        require_non_empty(&d.name_attribute, "directives.name_attribute")?;
        require_non_empty(&d.language_attribute, "directives.language_attribute")?;

        let elements = [&d.invocation, &d.body_slot, &d.variable_slot];
        for (i, a) in elements.iter().enumerate() {
            for b in &elements[i + 1..] {
                if a.eq_ignore_ascii_case(b) {
                    return Err(ConfigError::Validation(format!(
                        "directive element '{a}' is used for more than one directive"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Expand environment variable references in directory settings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let site = &mut self.site;
        for (value, field) in [
            (&mut site.source_dir, "site.source_dir"),
            (&mut site.template_dir, "site.template_dir"),
            (&mut site.resource_dir, "site.resource_dir"),
            (&mut site.output_dir, "site.output_dir"),
        ] {
            if let Some(dir) = value {
                *dir = expand::expand_env(dir, field)?;
            }
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.site_resolved = SiteConfig {
            source_dir: resolve(self.site.source_dir.as_deref(), "site"),
            template_dir: resolve(self.site.template_dir.as_deref(), "templates"),
            resource_dir: resolve(self.site.resource_dir.as_deref(), "resource"),
            output_dir: resolve(self.site.output_dir.as_deref(), "generated_site"),
            languages: self
                .site
                .languages
                .clone()
                .unwrap_or_else(|| vec!["en".to_owned()]),
        };
    }
}
