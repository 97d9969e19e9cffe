//! Result files under the output directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::MergedResult;
use crate::{nlog_debug, Result};

static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// File-name stem for a topic: lowercase, non-alphanumeric runs become `_`.
pub fn topic_slug(topic: &str) -> String {
    let lower = topic.to_lowercase();
    let slug = NON_ALNUM_RE.replace_all(&lower, "_");
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "topic".to_string()
    } else {
        slug.to_string()
    }
}

/// `<output_dir>/<slug>_result.json`
pub fn result_path(output_dir: &Path, topic: &str) -> PathBuf {
    output_dir.join(format!("{}_result.json", topic_slug(topic)))
}

/// Write the merged result as pretty JSON (2-space indent).
pub fn write_result(path: &Path, result: &MergedResult) -> Result<()> {
    let text = serde_json::to_string_pretty(result)?;
    fs::write(path, text)?;
    nlog_debug!("write_result path={}", path.display());
    Ok(())
}

pub fn load_result(path: &Path) -> Result<MergedResult> {
    nlog_debug!("load_result path={}", path.display());
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    MergedResult::from_value(value)
}
