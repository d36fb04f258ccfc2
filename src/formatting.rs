//! Log formatting utilities

/// Format bytes in human-readable format (KB, MB, GB)
#[inline]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Shorten UUID to first 8 characters for log readability
#[inline]
pub fn short_id(uuid: &uuid::Uuid) -> String {
    let s = uuid.to_string();
    s[..8].to_owned()
}

/// Render a command line for logs, replacing control bytes
pub fn printable_line(line: &[u8]) -> String {
    line.iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}
