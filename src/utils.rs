use crate::Result;
use filetime::FileTime;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Prefix of the hidden files a copy is staged in before being renamed into place
pub const TEMP_PREFIX: &str = ".drivebak-tmp-";

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Hidden staging file in `dir` that a copy is written to before the final rename.
///
/// The name is `.drivebak-tmp-<pid>-<seq>` and never embeds the target's own name, so a
/// target at the filesystem's name length limit can still be staged next to itself.
pub fn temp_path_for(dir: &Path) -> PathBuf {
    let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    dir.join(format!("{TEMP_PREFIX}{}-{seq}", std::process::id()))
}

/// Whether `name` has the exact shape produced by [`temp_path_for`]
pub fn is_staging_name(name: &OsStr) -> bool {
    let Some(rest) = name.to_str().and_then(|n| n.strip_prefix(TEMP_PREFIX)) else {
        return false;
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match rest.split_once('-') {
        Some((pid, seq)) => all_digits(pid) && all_digits(seq),
        None => false,
    }
}

/// Apply the source's access and modification times to `dest`
pub fn copy_timestamps(source: &fs::Metadata, dest: &Path) -> Result<()> {
    let atime = FileTime::from_last_access_time(source);
    let mtime = FileTime::from_last_modification_time(source);
    filetime::set_file_times(dest, atime, mtime)?;
    Ok(())
}

/// Format byte size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes < THRESHOLD {
        return format!("{bytes} B");
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    let unit = UNITS[unit_index];
    format!("{size:.1} {unit}")
}

/// Bytes as gibibytes with two decimals, the unit used by the space summary
pub fn format_gib(bytes: u64) -> String {
    format!("{:.2} GiB", bytes as f64 / GIB)
}

/// Integer with thousands separators, e.g. `12,345`
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `HH:MM:SS`, used on the live progress line
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// `Xm YYs`, used for the final elapsed time
pub fn format_minutes_seconds(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}m {:02}s", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(3 * 1024 / 2), "1.5 KB");
        assert_eq!(format_size(700 * 1024 * 1024), "700.0 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
        // Largest unit absorbs anything bigger
        assert_eq!(format_size(2048 * 1024_u64.pow(4)), "2048.0 TB");
    }

    #[test]
    fn test_format_gib() {
        assert_eq!(format_gib(0), "0.00 GiB");
        assert_eq!(format_gib(7 * 1024 * 1024 * 1024), "7.00 GiB");
        assert_eq!(format_gib(1024 * 1024 * 1024 / 2), "0.50 GiB");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_durations() {
        assert_eq!(format_clock(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_clock(Duration::from_secs(3725)), "01:02:05");
        assert_eq!(format_minutes_seconds(Duration::from_secs(65)), "1m 05s");
        assert_eq!(format_minutes_seconds(Duration::from_millis(999)), "0m 00s");
        assert_eq!(format_minutes_seconds(Duration::from_secs(7200)), "120m 00s");
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let dir = Path::new("/backup/Pictures");
        let first = temp_path_for(dir);
        let second = temp_path_for(dir);

        assert_eq!(first.parent(), Some(dir));
        assert_ne!(first, second);
        assert!(is_staging_name(first.file_name().unwrap()));
        assert!(is_staging_name(second.file_name().unwrap()));
    }

    #[test]
    fn test_temp_name_length_is_fixed() {
        let name = temp_path_for(Path::new("/backup")).file_name().unwrap().len();
        // prefix + u32 pid + u64 counter + separator
        assert!(name <= TEMP_PREFIX.len() + 10 + 1 + 20);
    }

    #[test]
    fn test_is_staging_name() {
        assert!(is_staging_name(OsStr::new(".drivebak-tmp-4242-0")));
        assert!(is_staging_name(OsStr::new(".drivebak-tmp-1-987654")));

        assert!(!is_staging_name(OsStr::new(".drivebak-tmp-notes.md")));
        assert!(!is_staging_name(OsStr::new(".drivebak-tmp-4242-cat.jpg")));
        assert!(!is_staging_name(OsStr::new(".drivebak-tmp-4242-")));
        assert!(!is_staging_name(OsStr::new(".drivebak-tmp--7")));
        assert!(!is_staging_name(OsStr::new("cat.jpg")));
    }

    #[test]
    fn test_copy_timestamps() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("holiday.jpg");
        let dest = dir.path().join(".drivebak-tmp-1-holiday.jpg");
        fs::write(&source, "jpg").unwrap();
        fs::write(&dest, "jpg").unwrap();

        let past = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&source, past).unwrap();

        let meta = fs::metadata(&source).unwrap();
        copy_timestamps(&meta, &dest).unwrap();

        let dest_meta = fs::metadata(&dest).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&dest_meta), past);
    }
}
