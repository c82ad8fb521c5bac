//! Build configuration
//!
//! `knit.config.json` is read into a [`serde_json::Value`], command-line
//! `key=value` overrides replace its top-level keys, and the result is
//! deserialized into [`Config`]. [`BuildOptions`] is the resolved form the
//! compiler works with: absolute root and output directory, normalized
//! entries.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::resolver::normalize_path;

/// Entry name used when `entry` is a single path
pub const DEFAULT_ENTRY_NAME: &str = "main";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Root directory; module ids are relative to it
    #[serde(default)]
    pub context: Option<PathBuf>,
    #[serde(default)]
    pub entry: Entry,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub module: ModuleConfig,
    #[serde(default)]
    pub resolve: ResolveConfig,
    /// Built-in plugin names
    #[serde(default)]
    pub plugins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Single(String),
    Named(IndexMap<String, String>),
}

impl Default for Entry {
    fn default() -> Self {
        Entry::Named(IndexMap::new())
    }
}

impl Entry {
    /// Entry requests keyed by name
    pub fn normalized(&self) -> IndexMap<String, String> {
        match self {
            Entry::Single(request) => {
                IndexMap::from([(DEFAULT_ENTRY_NAME.to_string(), request.clone())])
            }
            Entry::Named(entries) => entries.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Asset name template; `[name]` is replaced by the chunk name
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            filename: default_filename(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("dist")
}

fn default_filename() -> String {
    "[name].js".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Regular expression matched against the resolved resource path
    pub test: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<String>,
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub uses: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce: Option<Enforce>,
}

impl RuleConfig {
    /// Loader names of this rule: `loader` first, then `use` in order
    pub fn loader_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loader.iter().cloned().collect();
        match &self.uses {
            Some(OneOrMany::One(name)) => names.push(name.clone()),
            Some(OneOrMany::Many(list)) => names.extend(list.iter().cloned()),
            None => {}
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforce {
    Pre,
    Post,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec![".js".to_string(), ".json".to_string()]
}

impl Config {
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Read `path`, apply `overrides` and deserialize. A relative or
    /// missing `context` is taken relative to the config file's directory.
    pub fn load(path: &Path, overrides: &[String]) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut value: Value = serde_json::from_str(&text)?;
        apply_overrides(&mut value, overrides)?;
        let mut config = Config::from_value(value)?;

        let config_dir = absolute(path.parent().unwrap_or(Path::new("")))?;
        config.context = Some(match config.context.take() {
            Some(context) => normalize_path(&config_dir.join(context)),
            None => config_dir,
        });
        Ok(config)
    }
}

/// Replace top-level keys of `value` from `key=value` tokens. Values
/// that parse as JSON are used as JSON, anything else as a string.
pub fn apply_overrides(value: &mut Value, overrides: &[String]) -> Result<(), ConfigError> {
    let object = value.as_object_mut().ok_or(ConfigError::NotAnObject)?;
    for token in overrides {
        let (key, raw) = token
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidOverride(token.clone()))?;
        let key = key.trim_start_matches('-');
        if key.is_empty() {
            return Err(ConfigError::InvalidOverride(token.clone()));
        }
        let parsed = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        object.insert(key.to_string(), parsed);
    }
    Ok(())
}

/// Resolved settings for one compiler
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub root: PathBuf,
    /// Entry requests keyed by name, in configuration order
    pub entries: IndexMap<String, String>,
    pub output_path: PathBuf,
    pub filename: String,
    pub extensions: Vec<String>,
}

impl BuildOptions {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let root = match &config.context {
            Some(context) => absolute(context)?,
            None => absolute(Path::new(""))?,
        };
        let output_path = normalize_path(&root.join(&config.output.path));

        Ok(Self {
            entries: config.entry.normalized(),
            output_path,
            filename: config.output.filename.clone(),
            extensions: config.resolve.extensions.clone(),
            root,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
    Ok(normalize_path(&cwd.join(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_entry_is_named_main() {
        let config = Config::from_value(json!({ "entry": "./src/index.js" })).unwrap();
        let entries = config.entry.normalized();
        assert_eq!(entries.get("main").map(String::as_str), Some("./src/index.js"));
        assert_eq!(config.output.filename, "[name].js");
        assert_eq!(config.output.path, PathBuf::from("dist"));
        assert_eq!(config.resolve.extensions, vec![".js", ".json"]);
    }

    #[test]
    fn test_named_entries_keep_order() {
        let config = Config::from_value(json!({
            "entry": { "zeta": "./z.js", "alpha": "./a.js", "mid": "./m.js" }
        }))
        .unwrap();
        let names: Vec<_> = config.entry.normalized().into_keys().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_rules() {
        let config = Config::from_value(json!({
            "entry": "./a.js",
            "module": { "rules": [
                { "test": "\\.txt$", "loader": "raw-loader", "enforce": "pre" },
                { "test": "\\.json$", "use": ["json-loader", "other"] },
                { "test": "\\.md$", "use": "raw-loader", "enforce": "post" }
            ]}
        }))
        .unwrap();
        let rules = &config.module.rules;
        assert_eq!(rules[0].enforce, Some(Enforce::Pre));
        assert_eq!(rules[0].loader_names(), vec!["raw-loader"]);
        assert_eq!(rules[1].enforce, None);
        assert_eq!(rules[1].loader_names(), vec!["json-loader", "other"]);
        assert_eq!(rules[2].loader_names(), vec!["raw-loader"]);
    }

    #[test]
    fn test_unknown_enforce_is_rejected() {
        let result = Config::from_value(json!({
            "module": { "rules": [{ "test": "x", "loader": "a", "enforce": "middle" }] }
        }));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_overrides_replace_top_level_keys() {
        let mut value = json!({
            "entry": "./a.js",
            "output": { "path": "dist", "filename": "[name].js" }
        });
        apply_overrides(
            &mut value,
            &[
                "entry=./b.js".to_string(),
                "--mode=production".to_string(),
                "output={\"path\":\"out\"}".to_string(),
                "entry=./c.js".to_string(),
            ],
        )
        .unwrap();

        assert_eq!(value["entry"], json!("./c.js"));
        assert_eq!(value["mode"], json!("production"));
        // No deep merge: the filename default comes back
        let config = Config::from_value(value).unwrap();
        assert_eq!(config.output.path, PathBuf::from("out"));
        assert_eq!(config.output.filename, "[name].js");
    }

    #[test]
    fn test_override_without_equals() {
        let mut value = json!({});
        let err = apply_overrides(&mut value, &["verbose".to_string()]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride(token) if token == "verbose"));
    }

    #[test]
    fn test_load_defaults_context_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knit.config.json");
        std::fs::write(&path, r#"{ "entry": "./index.js" }"#).unwrap();

        let config = Config::load(&path, &[]).unwrap();
        assert_eq!(config.context.as_deref(), Some(dir.path()));

        let options = BuildOptions::from_config(&config).unwrap();
        assert_eq!(options.output_path, dir.path().join("dist"));
    }

    #[test]
    fn test_load_relative_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knit.config.json");
        std::fs::write(&path, r#"{ "context": "./app", "entry": "./index.js" }"#).unwrap();

        let config = Config::load(&path, &[]).unwrap();
        assert_eq!(config.context, Some(dir.path().join("app")));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/knit.config.json"), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
