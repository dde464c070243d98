//! Commit log parsing
//!
//! Parses the default `git log --parents` layout: a `commit <hash> <parent>`
//! line, header lines, a blank line, then the message indented by four spaces.

use crate::error::{Error, Result};
use crate::types::CommitRecord;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Trailer key carrying the stable commit id
pub const COMMIT_ID_TRAILER: &str = "commit-id";

/// Boundary line: `commit <hash> [<parent>...]`
static RE_COMMIT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^commit ([0-9a-f]{40}|[0-9a-f]{64})((?: [0-9a-f]+)*)\s*$").unwrap());

/// Trailer line: `commit-id: 1a2b3c4d`
static RE_TRAILER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^commit-id:\s*([0-9a-f]{8,40})\s*$").unwrap());

/// Parse raw commit log text into records, oldest first
///
/// Empty (or whitespace-only) input yields an empty stack.
pub fn parse_commit_log(raw: &str) -> Result<Vec<CommitRecord>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut blocks: Vec<(&str, Vec<&str>)> = Vec::new();
    for line in raw.lines() {
        if line.starts_with("commit ") {
            blocks.push((line, Vec::new()));
        } else if let Some((_, lines)) = blocks.last_mut() {
            lines.push(line);
        } else if !line.trim().is_empty() {
            return Err(Error::Parse(format!(
                "expected a commit line, found {line:?}"
            )));
        }
    }

    if blocks.is_empty() {
        return Err(Error::Parse("no commit boundary found".to_string()));
    }

    let records = blocks
        .into_iter()
        .map(|(header, lines)| parse_block(header, &lines))
        .collect::<Result<Vec<_>>>()?;

    Ok(order_oldest_first(records))
}

fn parse_block(header: &str, lines: &[&str]) -> Result<CommitRecord> {
    let caps = RE_COMMIT_LINE
        .captures(header)
        .ok_or_else(|| Error::Parse(format!("invalid commit line {header:?}")))?;
    let hash = caps[1].to_string();
    let parent = caps
        .get(2)
        .and_then(|m| m.as_str().split_whitespace().next())
        .map(ToString::to_string);

    // Header fields (Author, Date, Merge) run until the first blank line
    let message_start = lines
        .iter()
        .position(|l| l.trim().is_empty())
        .unwrap_or(lines.len());

    let mut commit_id = String::new();
    let mut message: Vec<&str> = Vec::new();
    for line in &lines[message_start..] {
        let text = strip_indent(line);
        if let Some(caps) = RE_TRAILER.captures(text.trim()) {
            commit_id = caps[1].to_ascii_lowercase();
            continue;
        }
        message.push(text);
    }

    let subject_idx = message.iter().position(|l| !l.trim().is_empty());
    let (subject, body) = subject_idx.map_or_else(
        || (String::new(), String::new()),
        |idx| {
            (
                message[idx].trim().to_string(),
                normalize_body(&message[idx + 1..]),
            )
        },
    );

    Ok(CommitRecord {
        hash,
        parent,
        commit_id,
        subject,
        body,
    })
}

/// `git log` indents message lines by four spaces
fn strip_indent(line: &str) -> &str {
    line.strip_prefix("    ").unwrap_or_else(|| line.trim_start())
}

/// Trim surrounding blank lines and collapse runs of blank lines to one
fn normalize_body(lines: &[&str]) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in lines {
        let line = line.trim_end();
        if line.is_empty() && out.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Order records oldest → newest
///
/// When parents link every record into a single chain, ancestry decides the
/// order. Otherwise the log is assumed newest-first and reversed.
fn order_oldest_first(mut records: Vec<CommitRecord>) -> Vec<CommitRecord> {
    if let Some(order) = ancestry_order(&records) {
        let mut by_hash: HashMap<String, CommitRecord> = records
            .drain(..)
            .map(|r| (r.hash.clone(), r))
            .collect();
        return order
            .iter()
            .filter_map(|hash| by_hash.remove(hash))
            .collect();
    }
    records.reverse();
    records
}

fn ancestry_order(records: &[CommitRecord]) -> Option<Vec<String>> {
    if records.len() < 2 {
        return None;
    }

    let hashes: HashSet<&str> = records.iter().map(|r| r.hash.as_str()).collect();
    let mut child_of: HashMap<&str, &str> = HashMap::new();
    let mut roots = Vec::new();

    for record in records {
        let parent = record.parent.as_deref()?;
        if hashes.contains(parent) {
            // Two children of one parent means the range is not linear
            if child_of.insert(parent, record.hash.as_str()).is_some() {
                return None;
            }
        } else {
            roots.push(record.hash.as_str());
        }
    }

    let [root] = roots.as_slice() else {
        return None;
    };

    let mut order = vec![(*root).to_string()];
    let mut cursor = *root;
    while let Some(child) = child_of.get(cursor) {
        order.push((*child).to_string());
        cursor = *child;
    }

    (order.len() == records.len()).then_some(order)
}

/// Stored commit message with its commit-id trailer set to `commit_id`
///
/// The message is kept byte for byte apart from any existing commit-id
/// trailer lines and trailing newlines.
pub fn with_commit_id(message: &str, commit_id: &str) -> String {
    let mut out = String::with_capacity(message.len() + COMMIT_ID_TRAILER.len() + 16);
    for line in message.split_inclusive('\n') {
        if !RE_TRAILER.is_match(line.trim()) {
            out.push_str(line);
        }
    }
    let kept = out.trim_end_matches(['\n', '\r']).len();
    out.truncate(kept);
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str(COMMIT_ID_TRAILER);
    out.push_str(": ");
    out.push_str(commit_id);
    out.push('\n');
    out
}
