//! Queueing new images into the inbox.

use crate::constants::store::TEMP_PREFIX;
use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Copy `source` into `inbox` under a sanitized, unused name.
///
/// The copy lands under a hidden temporary name first and is then linked into
/// place, so the watcher never sees a half-written file. Returns the queued path.
pub fn submit_file(inbox: &Path, source: &Path, extensions: &[String]) -> Result<PathBuf> {
    let raw_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = sanitize_filename(&raw_name).ok_or_else(|| Error::InvalidFileName {
        name: raw_name.clone(),
    })?;

    let accepted = Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)));
    if !accepted {
        return Err(Error::InvalidFileName { name: raw_name });
    }

    fs::create_dir_all(inbox)?;
    let temp = inbox.join(format!("{TEMP_PREFIX}{name}-{}", std::process::id()));
    fs::copy(source, &temp)?;

    let placed = place(&temp, inbox, &name);
    let _ = fs::remove_file(&temp);
    let target = placed?;

    info!("Queued {}", target.display());
    Ok(target)
}

/// Link `temp` into `inbox` as `name`, adding a unix-millis suffix if taken.
fn place(temp: &Path, inbox: &Path, name: &str) -> Result<PathBuf> {
    let mut target = inbox.join(name);
    let mut attempt = 0u32;

    loop {
        match fs::hard_link(temp, &target) {
            Ok(()) => return Ok(target),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(_) if !target.exists() => {
                fs::rename(temp, &target)?;
                return Ok(target);
            }
            Err(_) => {}
        }

        attempt += 1;
        target = inbox.join(suffixed(name, attempt));
    }
}

fn suffixed(name: &str, attempt: u32) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let tag = if attempt > 1 {
        format!("{millis}_{attempt}")
    } else {
        millis.to_string()
    };

    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{tag}.{ext}"),
        None => format!("{name}_{tag}"),
    }
}

/// Reduce a file name to ASCII alphanumerics, `.`, `-` and `_`.
///
/// Other characters become `_` and leading dots are stripped so the result is
/// never hidden. Returns `None` when nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_' || c == '.') {
        None
    } else {
        Some(cleaned.to_string())
    }
}
