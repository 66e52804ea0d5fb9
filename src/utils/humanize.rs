// src/utils/humanize.rs

const KB: u128 = 1024;
const MB: u128 = KB * KB;
const GB: u128 = MB * KB;

/// Renders a byte count as `"512B"`, `"1.5KB"`, `"2.0MB"` or `"3.1GB"`.
///
/// The fractional digit is truncated, never rounded: 1535 bytes is `"1.4KB"`.
pub fn natural_size(count: u64) -> String {
    let bytes = u128::from(count);
    let (unit, suffix) = match bytes {
        b if b < KB => return format!("{count}B"),
        b if b < MB => (KB, "KB"),
        b if b < GB => (MB, "MB"),
        _ => (GB, "GB"),
    };

    let tenths = bytes * 10 / unit;
    format!("{}.{}{}", tenths / 10, tenths % 10, suffix)
}
