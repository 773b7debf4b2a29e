//! Argument parsing shared by the transfer commands.

use anyhow::{bail, Context, Result};
use rmt_core::config::RmtConfig;
use std::path::{Path, PathBuf};

/// Split `bucket/object` at the first `/`. The object key may contain more slashes.
pub fn parse_target(target: &str) -> Result<(String, String)> {
    match target.split_once('/') {
        Some((bucket, object)) if !bucket.is_empty() && !object.is_empty() => {
            Ok((bucket.to_string(), object.to_string()))
        }
        _ => bail!("expected bucket/object, got {:?}", target),
    }
}

/// Parse a byte count with an optional binary or decimal suffix
/// (`4000000`, `8M`, `8MiB`, `1G`).
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, suffix) = s.split_at(split);
    let n: u64 = digits.parse().map_err(|_| format!("invalid size: {:?}", s))?;
    let unit: u64 = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1_000,
        "kib" => 1 << 10,
        "m" | "mb" => 1_000_000,
        "mib" => 1 << 20,
        "g" | "gb" => 1_000_000_000,
        "gib" => 1 << 30,
        other => return Err(format!("unknown size suffix: {:?}", other)),
    };
    let bytes = n.checked_mul(unit).ok_or_else(|| format!("size too large: {:?}", s))?;
    if bytes == 0 {
        return Err("size must be greater than zero".to_string());
    }
    Ok(bytes)
}

/// Store root from the flag, else from config.
pub fn store_root(flag: Option<&Path>, cfg: &RmtConfig) -> Result<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| cfg.store_root.clone())
        .context("no object store configured; pass --store or set store_root in config.toml")
}

/// `path` made absolute against the current directory, so checkpoints keep
/// working when later commands run from elsewhere.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("resolve current directory")?;
    Ok(cwd.join(path))
}
