//! Merge key/value pairs into a dotenv file

use std::path::Path;

use frag_core::Result;

/// Write `updates` into the dotenv file at `path`
///
/// Existing assignments of the same keys are replaced in place; comments, blank
/// lines and unrelated keys are kept; new keys are appended.
pub fn merge_env_file(path: &Path, updates: &[(String, String)]) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    std::fs::write(path, merge_env_text(&existing, updates))?;
    Ok(())
}

pub fn merge_env_text(existing: &str, updates: &[(String, String)]) -> String {
    let mut written = vec![false; updates.len()];
    let mut lines: Vec<String> = Vec::new();

    for line in existing.lines() {
        let key = assignment_key(line);
        match key.and_then(|k| updates.iter().position(|(name, _)| name == k)) {
            Some(i) => {
                if !written[i] {
                    lines.push(format_assignment(&updates[i].0, &updates[i].1));
                    written[i] = true;
                }
            }
            None => lines.push(line.to_string()),
        }
    }

    for (i, (key, value)) in updates.iter().enumerate() {
        if !written[i] {
            lines.push(format_assignment(key, value));
        }
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn assignment_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, _) = trimmed.split_once('=')?;
    Some(key.trim())
}

fn format_assignment(key: &str, value: &str) -> String {
    if value.chars().any(|c| c.is_whitespace() || c == '#' || c == '"') {
        format!("{}=\"{}\"", key, value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        format!("{}={}", key, value)
    }
}
