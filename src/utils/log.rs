// src/utils/log.rs

//! Log formatting helpers on top of the `log` facade.

/// Log a titled block of key/value lines, keys padded to a common width.
pub fn summary(title: &str, items: &[(&str, String)]) {
    for line in summary_lines(title, items) {
        log::info!("{}", line);
    }
}

fn summary_lines(title: &str, items: &[(&str, String)]) -> Vec<String> {
    let width = items.iter().map(|(key, _)| key.chars().count()).max().unwrap_or(0);
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(format!("[SUMMARY] {title}"));
    for (key, value) in items {
        lines.push(format!("    {key:<width$} : {value}"));
    }
    lines
}
