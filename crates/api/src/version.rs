//! Build facts reported by `--version`.
//!
//! Release builds set the `FASTBLOG_GIT_*` and `FASTBLOG_BUILD_DATE`
//! variables at compile time; local builds fall back to the crate version.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub git_version: String,
    pub git_commit: String,
    pub git_tree_state: String,
    pub build_date: String,
    pub compiler: String,
    pub platform: String,
}

impl Info {
    pub fn get() -> Self {
        Self {
            git_version: option_env!("FASTBLOG_GIT_VERSION")
                .map(str::to_string)
                .unwrap_or_else(|| format!("v{}", env!("CARGO_PKG_VERSION"))),
            git_commit: option_env!("FASTBLOG_GIT_COMMIT").unwrap_or("unknown").to_string(),
            git_tree_state: option_env!("FASTBLOG_GIT_TREE_STATE").unwrap_or("").to_string(),
            build_date: option_env!("FASTBLOG_BUILD_DATE")
                .unwrap_or("1970-01-01T00:00:00Z")
                .to_string(),
            compiler: "rustc".to_string(),
            platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.git_version.clone())
    }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.git_version)
    }
}

/// Value of `--version[=true|false|raw]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionFlag {
    #[default]
    False,
    True,
    Raw,
}

impl FromStr for VersionFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "true" | "1" | "t" => Ok(Self::True),
            "false" | "0" | "f" => Ok(Self::False),
            other => Err(format!("invalid version flag value '{other}' (expected true, false or raw)")),
        }
    }
}

impl VersionFlag {
    /// Text to print before exiting, if the flag asks for any.
    pub fn render(self) -> Option<String> {
        match self {
            Self::False => None,
            Self::True => Some(Info::get().to_string()),
            Self::Raw => Some(Info::get().to_json_pretty()),
        }
    }
}
