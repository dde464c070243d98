//! Stack descriptor rendering and PR body merging
//!
//! A PR body is the author's prose, a `---` separator line, then the stack
//! descriptor:
//!
//! ```text
//! Custom notes
//!
//! ---
//!
//! **Stack**:
//! - #3
//! - #2 ⬅
//! - #1
//! ```
//!
//! Only the part below the separator is owned by this tool.

/// Line separating user prose from the descriptor
pub const SEPARATOR: &str = "---";

/// First line of the descriptor
pub const STACK_HEADER: &str = "**Stack**:";

/// Suffix marking the PR the body belongs to
pub const CURRENT_MARKER: &str = " ⬅";

/// Stand-in for the number of a PR that does not exist yet
pub const NEW_PLACEHOLDER: &str = "#NEW";

/// One entry of the descriptor list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackRef {
    /// Existing PR
    Number(u64),
    /// PR about to be created
    New,
}

impl std::fmt::Display for StackRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "#{n}"),
            Self::New => f.write_str(NEW_PLACEHOLDER),
        }
    }
}

/// Render the descriptor for the PR at `current`
///
/// `stack` is bottom first; the list is rendered newest first. A stack of one
/// gets no descriptor.
pub fn render_descriptor(stack: &[StackRef], current: usize) -> Option<String> {
    if stack.len() < 2 {
        return None;
    }

    let mut out = String::from(STACK_HEADER);
    for (idx, entry) in stack.iter().enumerate().rev() {
        out.push_str("\n- ");
        out.push_str(&entry.to_string());
        if idx == current {
            out.push_str(CURRENT_MARKER);
        }
    }
    Some(out)
}

/// Split a body into user prose and the descriptor block (if any)
///
/// The split point is the last separator line directly followed (after
/// blank lines) by the stack header. Without one, the whole body is prose.
pub fn split_body(body: &str) -> (&str, Option<&str>) {
    let lines: Vec<(usize, &str)> = line_offsets(body).collect();

    let split = lines.iter().enumerate().rev().find_map(|(pos, (offset, line))| {
        if line.trim() != SEPARATOR {
            return None;
        }
        let next = lines[pos + 1..].iter().find(|(_, l)| !l.trim().is_empty());
        match next {
            Some((_, l)) if l.trim_start().starts_with("**Stack**") => Some(*offset),
            _ => None,
        }
    });

    match split {
        Some(offset) => {
            let descriptor = body[offset..]
                .trim_start_matches(|c: char| c == '-' || c.is_whitespace());
            (&body[..offset], Some(descriptor))
        }
        None => (body, None),
    }
}

/// Byte offset and text of every line
fn line_offsets(body: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    body.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        (start, raw.trim_end_matches(['\n', '\r']))
    })
}

/// Keep the user prose of `body` and replace its descriptor
///
/// `None` removes the descriptor block entirely.
pub fn merge_body(body: &str, descriptor: Option<&str>) -> String {
    let (prose, _) = split_body(body);
    let prose = trim_blank_tail(prose);

    match descriptor {
        None => prose.to_string(),
        Some(d) if prose.is_empty() => format!("{SEPARATOR}\n\n{d}"),
        Some(d) => format!("{prose}\n\n{SEPARATOR}\n\n{d}"),
    }
}

/// Drop trailing blank lines, keeping trailing spaces on the last text line
///
/// Two trailing spaces are a Markdown hard break.
fn trim_blank_tail(text: &str) -> &str {
    let content_end = text.trim_end().len();
    if content_end == 0 {
        return "";
    }
    let line_end = text[content_end..]
        .find('\n')
        .map_or(text.len(), |i| content_end + i);
    text[..line_end].trim_end_matches('\r')
}

/// Swap the `#NEW` placeholder for the assigned PR number
pub fn replace_placeholder(body: &str, number: u64) -> String {
    body.replace(NEW_PLACEHOLDER, &format!("#{number}"))
}
