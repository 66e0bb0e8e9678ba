//! JSON result files.
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

/// Result file name: `<name>.json`, or `<name>_<YYYYmmdd_HHMMSS>.json` (UTC)
/// when `timestamp` is set.
pub fn result_file_name(name: &str, timestamp: bool) -> String {
    if timestamp {
        let ts = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        format!("{}_{}.json", name, ts)
    } else {
        format!("{}.json", name)
    }
}

/// Writes `data` as indented JSON into `dir`, creating it if needed.
pub fn save_json<T: Serialize + ?Sized>(
    dir: &Path,
    name: &str,
    data: &T,
    timestamp: bool,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let path = dir.join(result_file_name(name, timestamp));
    let json_data = serde_json::to_string_pretty(data)?;
    let mut file = File::create(&path)?;
    file.write_all(json_data.as_bytes())?;

    Ok(path)
}

/// Indented JSON for console echo.
pub fn pretty<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("<unprintable: {}>", e))
}
