//! Parsers for structured git output.
//!
//! All the text-picking lives here so the backend stays a thin process
//! driver. Covered formats:
//! - `git blame --porcelain` (header + metadata + tab-prefixed content lines)
//! - `git diff --name-status` (one status letter and path per line)
//! - `"Name <address>"` author strings

use std::collections::HashMap;

use time::OffsetDateTime;

use super::backend::AuthorshipLine;

/// Metadata accumulated for one revision while walking porcelain output.
#[derive(Clone, Default)]
struct RevisionMeta {
    author: String,
    timestamp: Option<OffsetDateTime>,
    summary: String,
}

fn is_hex_hash(token: &str) -> bool {
    token.len() == 40 && token.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

/// Parse `git blame --porcelain` output.
///
/// Each record is a header line (`<40-hex> <orig> <final> [<count>]`),
/// zero or more metadata lines, and a tab-prefixed content line that closes
/// the record. Git emits full metadata only the first time a revision
/// appears; later records reuse what we cached for that hash.
pub fn parse_blame_porcelain(output: &str) -> Vec<AuthorshipLine> {
    let mut lines = Vec::new();
    let mut cache: HashMap<String, RevisionMeta> = HashMap::new();

    let mut current_hash: Option<String> = None;
    let mut current_meta = RevisionMeta::default();
    let mut line_number: u32 = 0;

    for raw in output.lines() {
        if let Some(content) = raw.strip_prefix('\t') {
            // Content line closes the record.
            if let Some(hash) = current_hash.clone() {
                cache.insert(hash.clone(), current_meta.clone());
                lines.push(AuthorshipLine {
                    line_number,
                    hash,
                    author: current_meta.author.clone(),
                    timestamp: current_meta
                        .timestamp
                        .unwrap_or(OffsetDateTime::UNIX_EPOCH),
                    summary: current_meta.summary.clone(),
                    content: content.to_string(),
                });
            }
            continue;
        }

        let mut parts = raw.split_whitespace();
        let first = parts.next().unwrap_or_default();
        if is_hex_hash(first) {
            // Header: "<hash> <orig-line> <final-line> [<group-size>]"
            current_hash = Some(first.to_string());
            line_number = parts.nth(1).and_then(|n| n.parse().ok()).unwrap_or(0);
            current_meta = cache.get(first).cloned().unwrap_or_default();
        } else if current_hash.is_some() {
            if let Some(author) = raw.strip_prefix("author ") {
                current_meta.author = author.to_string();
            } else if let Some(ts) = raw.strip_prefix("author-time ") {
                current_meta.timestamp = ts
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok());
            } else if let Some(summary) = raw.strip_prefix("summary ") {
                current_meta.summary = summary.to_string();
            }
        }
    }

    lines
}

/// Parse `git diff --name-status` output into (added, modified, deleted).
///
/// The diff is run with `--no-renames` so a rename arrives as one `D` and one
/// `A` row; a stray `R`/`C` row (two path columns) is still split into
/// deleted(old) + added(new) so downstream consumers never see a "moved"
/// entry they don't understand.
pub fn parse_name_status(output: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut deleted = Vec::new();

    for line in output.lines() {
        let mut fields = line.trim().split('\t');
        let status = match fields.next() {
            Some(s) if !s.is_empty() => s,
            _ => continue,
        };
        let Some(path) = fields.next() else { continue };

        match status.chars().next() {
            Some('A') => added.push(path.to_string()),
            Some('D') => deleted.push(path.to_string()),
            Some('R') | Some('C') => {
                if let Some(new_path) = fields.next() {
                    deleted.push(path.to_string());
                    added.push(new_path.to_string());
                } else {
                    modified.push(path.to_string());
                }
            }
            Some('M') | Some('T') => modified.push(path.to_string()),
            _ => {}
        }
    }

    (added, modified, deleted)
}

/// Split a `"Name <address>"` string into `(name, address)`.
///
/// Without a `<...>` delimiter the whole string is the name and the address
/// is empty.
pub fn parse_author_string(author: &str) -> (String, String) {
    if let Some(open) = author.find('<') {
        if let Some(close) = author[open..].find('>') {
            let name = author[..open].trim().to_string();
            let address = author[open + 1..open + close].trim().to_string();
            return (name, address);
        }
    }
    (author.trim().to_string(), String::new())
}
