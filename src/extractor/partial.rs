//! Stalled partial-download detection
//!
//! A genuine slow transfer accumulates bytes quickly; a partial that stays
//! tiny is evidence the source silently blocked the connection. Suspect
//! partials must never be resumed, so the check errs toward "stalled".

use std::path::Path;
use tracing::debug;

/// Partials below this size are treated as frozen, not merely slow.
pub const STALL_THRESHOLD_BYTES: u64 = 512 * 1024;

/// Suffix the extraction layer gives in-progress files.
const PARTIAL_SUFFIX: &str = ".part";

/// Does the scratch directory hold a stalled partial for this item?
///
/// Any I/O error while inspecting counts as stalled: an unreadable artifact
/// is re-attempted cleanly rather than trusted.
pub fn is_partial_stalled(scratch_dir: &Path, video_id: &str) -> bool {
    if !scratch_dir.is_dir() {
        return false;
    }

    let entries = match std::fs::read_dir(scratch_dir) {
        Ok(entries) => entries,
        Err(_) => return true,
    };

    for entry in entries {
        let Ok(entry) = entry else {
            return true;
        };
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(video_id) || !name.ends_with(PARTIAL_SUFFIX) {
            continue;
        }

        match entry.metadata() {
            Ok(meta) if meta.len() < STALL_THRESHOLD_BYTES => {
                debug!(
                    "Partial {} is {} bytes, below the stall floor",
                    name,
                    meta.len()
                );
                return true;
            }
            Ok(_) => {}
            Err(_) => return true,
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VID: &str = "dQw4w9WgXcQ";

    #[test]
    fn missing_scratch_dir_is_not_stalled() {
        assert!(!is_partial_stalled(Path::new("/nonexistent/scratch"), VID));
    }

    #[test]
    fn empty_partial_is_stalled() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(format!("{VID}.webm.part")), b"").unwrap();
        assert!(is_partial_stalled(temp.path(), VID));
    }

    #[test]
    fn tiny_partial_is_stalled() {
        let temp = TempDir::new().unwrap();
        let data = vec![0u8; (STALL_THRESHOLD_BYTES - 1) as usize];
        std::fs::write(temp.path().join(format!("{VID}.webm.part")), &data).unwrap();
        assert!(is_partial_stalled(temp.path(), VID));
    }

    #[test]
    fn partial_at_threshold_is_progressing() {
        let temp = TempDir::new().unwrap();
        let data = vec![0u8; STALL_THRESHOLD_BYTES as usize];
        std::fs::write(temp.path().join(format!("{VID}.webm.part")), &data).unwrap();
        assert!(!is_partial_stalled(temp.path(), VID));
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("other.webm.part"), b"").unwrap();
        std::fs::write(temp.path().join(format!("{VID}.webm")), b"").unwrap();
        assert!(!is_partial_stalled(temp.path(), VID));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_scratch_dir_is_stalled() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let scratch = temp.path().join("scratch");
        std::fs::create_dir(&scratch).unwrap();
        std::fs::write(scratch.join(format!("{VID}.webm.part")), b"").unwrap();

        let mut perms = std::fs::metadata(&scratch).unwrap().permissions();
        perms.set_mode(0o000);
        std::fs::set_permissions(&scratch, perms.clone()).unwrap();

        // Root ignores permission bits, so the failure cannot be provoked.
        if std::fs::read_dir(&scratch).is_ok() {
            perms.set_mode(0o755);
            std::fs::set_permissions(&scratch, perms).unwrap();
            return;
        }

        let stalled = is_partial_stalled(&scratch, VID);

        perms.set_mode(0o755);
        std::fs::set_permissions(&scratch, perms).unwrap();

        assert!(stalled);
    }
}
