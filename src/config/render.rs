//! `[render]` section configuration.

use std::path::PathBuf;

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[render]` section in tutkit.toml - template rendering settings.
///
/// # Example
/// ```toml
/// [render]
/// templates = "templates"
/// solutions = "solutions"
/// exercises = "exercises"
/// source_exts = ["c", "h", "camkes", "md", "cmake"]
/// target = "arm"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Tutorial template trees, one subdirectory per tutorial.
    #[serde(default = "defaults::render::templates")]
    #[educe(Default = defaults::render::templates())]
    pub templates: PathBuf,

    /// Default output dir for solution-mode stage renders.
    #[serde(default = "defaults::render::solutions")]
    #[educe(Default = defaults::render::solutions())]
    pub solutions: PathBuf,

    /// Default output dir for exercise-mode stage renders.
    #[serde(default = "defaults::render::exercises")]
    #[educe(Default = defaults::render::exercises())]
    pub exercises: PathBuf,

    /// File extensions passed through the template evaluator.
    /// Everything else is copied verbatim.
    #[serde(default = "defaults::render::source_exts")]
    #[educe(Default = defaults::render::source_exts())]
    pub source_exts: Vec<String>,

    /// Architecture/runtime tag handed to render sessions.
    #[serde(default = "defaults::render::target")]
    #[educe(Default = defaults::render::target())]
    pub target: String,

    /// Task-name list artifact, relative to the stage output dir.
    #[serde(default = "defaults::render::tasks_manifest")]
    #[educe(Default = defaults::render::tasks_manifest())]
    pub tasks_manifest: PathBuf,

    /// Expected-output artifact, relative to the stage output dir.
    #[serde(default = "defaults::render::completion_file")]
    #[educe(Default = defaults::render::completion_file())]
    pub completion_file: PathBuf,

    /// Written-files manifest, relative to the stage output dir.
    #[serde(default = "defaults::render::files_manifest")]
    #[educe(Default = defaults::render::files_manifest())]
    pub files_manifest: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::super::WorkspaceConfig;

    #[test]
    fn test_render_defaults() {
        let config: WorkspaceConfig = toml::from_str("").unwrap();
        assert_eq!(config.render.templates.to_str(), Some("templates"));
        assert_eq!(config.render.target, "arm");
        assert!(config.render.source_exts.iter().any(|e| e == "c"));
        assert_eq!(config.render.completion_file.to_str(), Some("completion.toml"));
    }

    #[test]
    fn test_render_override() {
        let config: WorkspaceConfig = toml::from_str(
            r#"
            [render]
            source_exts = ["rs"]
            target = "riscv"
        "#,
        )
        .unwrap();
        assert_eq!(config.render.source_exts, vec!["rs"]);
        assert_eq!(config.render.target, "riscv");
    }
}
