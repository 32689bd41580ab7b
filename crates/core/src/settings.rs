//! User settings for serialization.
//!
//! Settings are a closed, typed record. They are read from a JSON file
//! whose keys match what a browser extension would store:
//!
//! ```json
//! {
//!   "outputFormat": "markdown",
//!   "attachTitle": true,
//!   "attachURL": false,
//!   "language": "system",
//!   "excludedEditorClasses": ["my-editor"],
//!   "excludedEditorSelectors": ["[data-slate-editor]"]
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::editable::{EditorExclusion, EditorExclusionConfig};
use crate::{ClipError, Result};

/// Output format of the serialized block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Plaintext,
}

impl FromStr for OutputFormat {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "plaintext" | "text" | "txt" => Ok(Self::Plaintext),
            other => Err(ClipError::ConfigError(format!("unknown output format `{}`", other))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown => f.write_str("markdown"),
            Self::Plaintext => f.write_str("plaintext"),
        }
    }
}

/// Language of the source attachment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Follow the process locale.
    #[default]
    System,
    En,
    Zh,
}

impl FromStr for Language {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "en" => Ok(Self::En),
            "zh" => Ok(Self::Zh),
            other => Err(ClipError::ConfigError(format!("unknown language `{}`", other))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::En => f.write_str("en"),
            Self::Zh => f.write_str("zh"),
        }
    }
}

/// Per-call serialization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub output_format: OutputFormat,
    pub attach_title: bool,
    #[serde(rename = "attachURL")]
    pub attach_url: bool,
    pub language: Language,
}

impl Settings {
    pub fn markdown() -> Self {
        Self::default()
    }

    pub fn plaintext() -> Self {
        Self { output_format: OutputFormat::Plaintext, ..Self::default() }
    }

    pub fn with_attachments(mut self, title: bool, url: bool) -> Self {
        self.attach_title = title;
        self.attach_url = url;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

/// The settings file: [`Settings`] plus editor exclusion lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(flatten)]
    pub settings: Settings,
    #[serde(flatten)]
    pub editors: EditorExclusionConfig,
}

impl SettingsFile {
    /// Reads and parses a settings file.
    ///
    /// # Errors
    ///
    /// Returns [`ClipError::FileNotFound`] if the path does not exist and
    /// [`ClipError::ConfigError`] if it cannot be read or holds invalid JSON
    /// or unknown enum values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ClipError::FileNotFound(path.to_path_buf()));
        }
        let contents =
            fs::read_to_string(path).map_err(|e| ClipError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let file = Self::from_json(&contents).map_err(|e| ClipError::ConfigError(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(file)
    }

    /// Loads `~/.config/clipblock/settings.json`, or defaults when absent.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ClipError::ConfigError(e.to_string()))
    }

    /// Default settings location (~/.config/clipblock/settings.json)
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("clipblock").join("settings.json"))
    }

    /// Editor exclusion built from the fallback lists and this file's lists.
    pub fn editor_exclusion(&self) -> Result<EditorExclusion> {
        EditorExclusion::from_config(&self.editors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.output_format, OutputFormat::Markdown);
        assert!(!settings.attach_title);
        assert!(!settings.attach_url);
        assert_eq!(settings.language, Language::System);
    }

    #[test]
    fn test_json_keys() {
        let json = r#"{"outputFormat":"plaintext","attachTitle":true,"attachURL":true,"language":"zh"}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.output_format, OutputFormat::Plaintext);
        assert!(settings.attach_title);
        assert!(settings.attach_url);
        assert_eq!(settings.language, Language::Zh);
        assert_eq!(serde_json::to_string(&settings).unwrap(), json);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let file = SettingsFile::from_json(r#"{"attachTitle":true}"#).unwrap();
        assert_eq!(file.settings, Settings::default().with_attachments(true, false));
        assert_eq!(file.editors, EditorExclusionConfig::default());
    }

    #[test]
    fn test_unknown_enum_value() {
        let result = SettingsFile::from_json(r#"{"outputFormat":"html"}"#);
        assert!(matches!(result, Err(ClipError::ConfigError(_))));
    }

    #[test]
    fn test_load_file_with_editor_lists() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"outputFormat":"markdown","excludedEditorClasses":["my-editor"],"excludedEditorSelectors":["[data-editor]"]}}"#
        )
        .unwrap();

        let loaded = SettingsFile::load(file.path()).unwrap();
        assert_eq!(loaded.editors.excluded_editor_classes, Some(vec!["my-editor".to_string()]));

        let exclusion = loaded.editor_exclusion().unwrap();
        assert!(exclusion.class_names().iter().any(|c| c == "my-editor"));
        assert_eq!(exclusion.selectors().count(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let result = SettingsFile::load(Path::new("/nonexistent/clipblock/settings.json"));
        assert!(matches!(result, Err(ClipError::FileNotFound(_))));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Plaintext".parse::<OutputFormat>().unwrap(), OutputFormat::Plaintext);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Zh);
        assert!("fr".parse::<Language>().is_err());
    }
}
