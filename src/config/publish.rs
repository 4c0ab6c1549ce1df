//! `[publish]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[publish]` section in tutkit.toml - what goes into a published repo
/// besides the rendered solution and exercise trees.
///
/// # Example
/// ```toml
/// [publish]
/// dirs = ["docs", "build-config"]
/// files = ["LICENSE", "README.md"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Directories copied verbatim into the published repo.
    #[serde(default = "defaults::publish::dirs")]
    #[educe(Default = defaults::publish::dirs())]
    pub dirs: Vec<String>,

    /// Files copied verbatim into the published repo.
    #[serde(default = "defaults::publish::files")]
    #[educe(Default = defaults::publish::files())]
    pub files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::WorkspaceConfig;

    #[test]
    fn test_publish_defaults() {
        let config: WorkspaceConfig = toml::from_str("").unwrap();
        assert_eq!(config.publish.dirs, vec!["docs", "build-config"]);
        assert_eq!(config.publish.files, vec!["LICENSE", "README.md"]);
    }
}
