//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }
}

// ============================================================================
// [env] Section Defaults
// ============================================================================

pub mod env {
    use std::path::PathBuf;

    pub fn environments() -> Vec<String> {
        vec!["sel4".into(), "camkes".into()]
    }

    pub fn apps_link() -> PathBuf {
        "apps".into()
    }

    pub fn configs_link() -> PathBuf {
        "configs".into()
    }

    pub fn build_config_dir() -> PathBuf {
        "build-config".into()
    }
}

// ============================================================================
// [render] Section Defaults
// ============================================================================

pub mod render {
    use std::path::PathBuf;

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn solutions() -> PathBuf {
        "solutions".into()
    }

    pub fn exercises() -> PathBuf {
        "exercises".into()
    }

    pub fn source_exts() -> Vec<String> {
        ["c", "h", "camkes", "md", "cmake"]
            .map(String::from)
            .to_vec()
    }

    pub fn target() -> String {
        "arm".into()
    }

    pub fn tasks_manifest() -> PathBuf {
        "tasks.list".into()
    }

    pub fn completion_file() -> PathBuf {
        "completion.toml".into()
    }

    pub fn files_manifest() -> PathBuf {
        "manifest.json".into()
    }
}

// ============================================================================
// [run] Section Defaults
// ============================================================================

pub mod run {
    use std::collections::BTreeMap;

    use super::super::PlatformConfig;

    pub fn build_command() -> Vec<String> {
        vec!["make".into()]
    }

    pub fn build_steps() -> Vec<Vec<String>> {
        [
            &["clean"][..],
            &["{config}"],
            &["silentoldconfig"],
            &["-j{jobs}"],
        ]
        .iter()
        .map(|step| step.iter().map(|s| (*s).to_owned()).collect())
        .collect()
    }

    pub fn jobs() -> usize {
        1
    }

    /// Timeout per test in seconds
    pub fn timeout() -> u64 {
        1800
    }

    pub fn failure_markers() -> Vec<String> {
        vec!["Ignoring call to sys_exit_group".into()]
    }

    pub fn platforms() -> BTreeMap<String, PlatformConfig> {
        let mut platforms = BTreeMap::new();
        platforms.insert(
            "pc99".to_owned(),
            PlatformConfig {
                qemu: "qemu-system-i386".into(),
                args: ["-nographic", "-m", "512", "-cpu", "Haswell"]
                    .map(String::from)
                    .to_vec(),
                arch: "ia32".into(),
                image: "images/{name}-image-{arch}-{plat}".into(),
                kernel: Some("images/kernel-ia32-pc99".into()),
            },
        );
        platforms.insert(
            "imx31".to_owned(),
            PlatformConfig {
                qemu: "qemu-system-arm".into(),
                args: ["-nographic", "-M", "kzm"].map(String::from).to_vec(),
                arch: "arm".into(),
                image: "images/{name}-image-{arch}-{plat}".into(),
                kernel: None,
            },
        );
        platforms
    }
}

// ============================================================================
// [publish] Section Defaults
// ============================================================================

pub mod publish {
    pub fn dirs() -> Vec<String> {
        vec!["docs".into(), "build-config".into()]
    }

    pub fn files() -> Vec<String> {
        vec!["LICENSE".into(), "README.md".into()]
    }
}
