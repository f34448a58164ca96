//! Human-readable byte sizes.

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const KIB: f64 = 1024.0;

/// `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.25 MB`: base 1024, at most two decimals, trailing
/// zeros dropped. Sizes beyond the gigabyte range stay in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_owned();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= KIB && unit < UNITS.len() - 1 {
        value /= KIB;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Size shown next to each fragment: megabytes above 1 MiB, kilobytes otherwise.
pub fn display_size(bytes: u64) -> String {
    let bytes = bytes as f64;
    if bytes > KIB * KIB {
        format!("{:.2} MB", bytes / (KIB * KIB))
    } else {
        format!("{:.1} KB", bytes / KIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1000), "1000 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
        assert_eq!(format_file_size(2048 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn display_size_switches_to_megabytes_above_one_mebibyte() {
        assert_eq!(display_size(2048), "2.0 KB");
        assert_eq!(display_size(1024 * 1024), "1024.0 KB");
        assert_eq!(display_size(3 * 1024 * 1024), "3.00 MB");
    }
}
