use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How an indexing pass makes its records visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// Collect a class's records locally and publish them once the pass
    /// succeeds. A failed pass contributes nothing.
    #[default]
    Buffered,
    /// Append each record as soon as it is produced. Records appended before
    /// a failure stay visible.
    Streaming,
}

/// Top-level configuration, matching `xref.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XrefConfig {
    #[serde(default)]
    pub usage: UsageSection,
    #[serde(default)]
    pub indexing: IndexingSection,
    #[serde(default)]
    pub annotations: AnnotationSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSection {
    /// Lines starting with this text are never counted as usages.
    pub import_prefix: String,
    /// File constructor references under the declaring class as well.
    pub constructor_class_usage: bool,
    pub publish: PublishMode,
}

impl Default for UsageSection {
    fn default() -> Self {
        Self {
            import_prefix: "import ".to_string(),
            constructor_class_usage: true,
            publish: PublishMode::Buffered,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSection {
    /// Worker threads for batch indexing; 0 uses the global rayon pool.
    pub threads: usize,
    pub show_progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationSection {
    /// Prepended to each spliced comment.
    pub comment_prefix: String,
}

impl Default for AnnotationSection {
    fn default() -> Self {
        Self {
            comment_prefix: "// ".to_string(),
        }
    }
}

impl XrefConfig {
    pub fn from_toml_str(source: &str) -> crate::error::Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.usage.import_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "usage.import_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XrefError;

    #[test]
    fn empty_document_gives_defaults() {
        let config = XrefConfig::from_toml_str("").unwrap();
        assert_eq!(config.usage.import_prefix, "import ");
        assert!(config.usage.constructor_class_usage);
        assert_eq!(config.usage.publish, PublishMode::Buffered);
        assert_eq!(config.indexing.threads, 0);
        assert_eq!(config.annotations.comment_prefix, "// ");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = XrefConfig::from_toml_str(
            "[usage]\npublish = \"streaming\"\n\n[indexing]\nthreads = 4\n",
        )
        .unwrap();
        assert_eq!(config.usage.publish, PublishMode::Streaming);
        assert_eq!(config.usage.import_prefix, "import ");
        assert_eq!(config.indexing.threads, 4);
    }

    #[test]
    fn empty_import_prefix_is_rejected() {
        let err = XrefConfig::from_toml_str("[usage]\nimport_prefix = \"\"\n").unwrap_err();
        assert!(matches!(err, XrefError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn bad_syntax_is_a_parse_error() {
        let err = XrefConfig::from_toml_str("[usage\n").unwrap_err();
        assert!(matches!(err, XrefError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xref.toml");
        std::fs::write(&path, "[annotations]\ncomment_prefix = \"/* \"\n").unwrap();
        let config = XrefConfig::load(&path).unwrap();
        assert_eq!(config.annotations.comment_prefix, "/* ");
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = XrefConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, XrefError::Config(ConfigError::NotFound(_))));
    }
}
