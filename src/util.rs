// Formatting helpers shared by the tables, the overview and the exporters.
use num_format::{Locale, ToFormattedString};

/// Longest sanitized question text kept in an export file name.
pub const MAX_FILE_STEM: usize = 50;

/// `100 * count / total`, or 0 when there is nothing to divide by.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

/// Two decimals and a trailing `%`, e.g. `33.33%`.
pub fn format_percent(p: f64) -> String {
    // A NaN must never reach a table cell; print it as zero.
    let p = if p.is_finite() { p } else { 0.0 };
    format!("{:.2}%", p)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

/// Keeps alphanumerics and spaces, turns spaces into `_` and caps the length.
pub fn sanitize_file_stem(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_FILE_STEM)
        .collect()
}

pub fn export_file_name(question: &str, extension: &str) -> String {
    format!("Survey_Report_{}.{}", sanitize_file_stem(question), extension)
}

/// Minimal HTML escaping for cell text and titles.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
