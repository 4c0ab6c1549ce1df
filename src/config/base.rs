//! `[base]` section configuration.
//!
//! Basic information about the tutorial collection.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in tutkit.toml - tutorial collection metadata.
///
/// # Example
/// ```toml
/// [base]
/// name = "os-tutorials"
/// description = "Hands-on microkernel exercises"
/// author = "Course Staff"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Collection name, used in published output.
    pub name: String,

    /// Short description for the published README.
    pub description: String,

    /// Author credited in published output.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,
}
