use std::path::PathBuf;

use serde::Deserialize;

use cftemplate_core::value::ParameterOverrides;

/// Application configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Compile configuration section
    #[serde(default)]
    pub compile: CompileConfig,

    /// Parameter default overrides, applied to every template
    #[serde(default)]
    pub parameters: ParameterOverrides,
}

/// Compile configuration section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Directory to load templates from
    pub input_dir: PathBuf,

    /// Directory to store the compiled templates in
    pub output_dir: PathBuf,

    /// Case-insensitive file name patterns to compile
    pub includes: Vec<String>,

    /// Case-insensitive file name patterns to skip; these win over includes
    pub excludes: Vec<String>,

    /// When compiled documents are written
    pub write_policy: WritePolicy,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("src/main/cftemplates"),
            output_dir: PathBuf::from("target/processed-resources/cftemplates"),
            includes: vec!["*stack.rb".to_string(), "*stack.json".to_string()],
            excludes: Vec::new(),
            write_policy: WritePolicy::default(),
        }
    }
}

/// Whether a document is written for a source whose result has errors.
///
/// Sources that produce no document at all never write one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Write a best-effort document even when the source has errors
    #[default]
    Always,
    /// Write nothing for a source whose result contains an error
    SkipOnError,
}

impl WritePolicy {
    /// Returns `true` if a document should be written.
    pub fn should_write(self, has_failures: bool) -> bool {
        match self {
            WritePolicy::Always => true,
            WritePolicy::SkipOnError => !has_failures,
        }
    }
}
