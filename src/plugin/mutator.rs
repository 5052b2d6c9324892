//! Install and uninstall as single-entry splices into one plugin list.
//!
//! Appends copy the separator already used between entries (or derive it from
//! the whitespace after `[`) and the quote style of the first entry, so a new
//! entry looks like it was typed by the file's author. Every edit is re-parsed
//! and checked against the expected list before anything is written.

use tracing::info;

use crate::plugin::accessor::{self, ListSelector, PluginList};
use crate::plugin::document::{ConfigDocument, Edit};
use crate::plugin::error::ConfigError;
use crate::plugin::store::ConfigStore;
use crate::syntax::{ParseError, Span, literal};

/// Whether `id` is in the selected list. A missing or unreadable list means
/// "not installed".
pub fn is_installed(document: &ConfigDocument, id: &str, selector: ListSelector) -> bool {
    accessor::get_list(document, selector)
        .map(|list| list.contains(id))
        .unwrap_or(false)
}

/// The selected list in file order, or `None` when it is empty or missing.
pub fn list(document: &ConfigDocument, selector: ListSelector) -> Option<Vec<String>> {
    accessor::get_list(document, selector)
        .ok()
        .filter(|list| !list.is_empty())
        .map(|list| list.to_string_list())
}

pub fn install(store: &mut ConfigStore, id: &str, selector: ListSelector) -> Result<(), ConfigError> {
    let document = store.document()?;
    if is_installed(document, id, selector) {
        return Err(ConfigError::AlreadyInstalled(id.to_string()));
    }

    let list = accessor::get_list(document, selector)?;
    let edit = append_edit(document.source(), &list, id);
    let mut expected = list.to_string_list();
    expected.push(id.to_string());

    let updated = apply_checked(document, &edit, selector, &expected)?;
    store.commit(updated)?;
    info!(plugin = id, field = list.field, "plugin installed");
    Ok(())
}

pub fn uninstall(
    store: &mut ConfigStore,
    id: &str,
    selector: ListSelector,
) -> Result<(), ConfigError> {
    let document = store.document()?;
    if !is_installed(document, id, selector) {
        return Err(ConfigError::NotInstalled(id.to_string()));
    }

    let list = accessor::get_list(document, selector)?;
    let Some(index) = list.position(id) else {
        return Err(ConfigError::NotInstalled(id.to_string()));
    };
    let edit = remove_edit(document.source(), &list, index);
    let mut expected = list.to_string_list();
    expected.remove(index);

    let updated = apply_checked(document, &edit, selector, &expected)?;
    store.commit(updated)?;
    info!(plugin = id, field = list.field, "plugin uninstalled");
    Ok(())
}

/// Applies `edit`, then confirms the targeted list reads back as `expected`
/// and the other list did not move.
fn apply_checked(
    document: &ConfigDocument,
    edit: &Edit,
    selector: ListSelector,
    expected: &[String],
) -> Result<ConfigDocument, ConfigError> {
    let updated = document.apply(edit)?;

    let actual = accessor::get_list(&updated, selector)?.to_string_list();
    let other_before = accessor::get_list(document, selector.other())
        .ok()
        .map(|list| list.to_string_list());
    let other_after = accessor::get_list(&updated, selector.other())
        .ok()
        .map(|list| list.to_string_list());

    if actual != expected || other_before != other_after {
        return Err(ParseError::field(
            selector.field_name(),
            "could not be edited without changing other entries",
        )
        .into());
    }

    Ok(updated)
}

fn append_edit(source: &str, list: &PluginList, id: &str) -> Edit {
    let quote = list.entries.first().map(|entry| entry.quote).unwrap_or('"');
    let literal = literal::quote(id, quote);

    let (last, separator) = match list.entries.as_slice() {
        [] => return Edit::insert(list.inner.start, literal),
        [only] => {
            let gap = &source[list.inner.start..only.span.start];
            let separator = if gap.contains('\n') {
                separator(gap)
            } else {
                ", ".to_string()
            };
            (only, separator)
        }
        [.., prev, last] => {
            let gap_start = prev.comma.map(|comma| comma.end).unwrap_or(prev.span.end);
            (last, separator(&source[gap_start..last.span.start]))
        }
    };

    // A comment trailing the last entry stays on that entry's line.
    let own_end = last.comma.map(|comma| comma.end).unwrap_or(last.span.end);
    let commented = line_tail(source, own_end).filter(|&nl| !source[own_end..nl].trim().is_empty());
    let Some(nl) = commented else {
        return Edit::insert(last.span.end, format!("{separator}{literal}"));
    };

    let next_line = match separator.strip_prefix(',') {
        Some(rest) if rest.contains('\n') => rest.to_string(),
        _ => {
            let newline = if source[nl..].starts_with("\r\n") { "\r\n" } else { "\n" };
            format!("{newline}{}", indentation(source, last.span.start))
        }
    };

    match last.comma {
        Some(_) => Edit::insert(nl, format!("{next_line}{literal},")),
        None => Edit::replace(
            Span::new(last.span.end, nl),
            format!(",{}{next_line}{literal}", &source[last.span.end..nl]),
        ),
    }
}

/// Builds the separator that precedes a new entry from the text found
/// between a comma and the entry after it.
fn separator(gap: &str) -> String {
    match gap.rfind('\n') {
        Some(idx) => {
            let newline = if gap[..idx].ends_with('\r') { "\r\n" } else { "\n" };
            let indent: String = gap[idx + 1..]
                .chars()
                .take_while(|c| c.is_whitespace())
                .collect();
            format!(",{newline}{indent}")
        }
        None if gap.is_empty() => ",".to_string(),
        None => ", ".to_string(),
    }
}

/// Removes one entry with its own comma and same-line comment. Comments and
/// blank lines around other entries are left alone.
fn remove_edit(source: &str, list: &PluginList, index: usize) -> Edit {
    let entries = &list.entries;
    let target = &entries[index];
    let own_end = target.comma.map(|comma| comma.end).unwrap_or(target.span.end);

    let line_start = line_start(source, target.span.start);
    let own_line = is_blank(&source[line_start..target.span.start]);
    let tail = line_tail(source, own_end);
    // The entry's whole line, newline included, when nothing else is on it.
    let whole_line = tail
        .filter(|_| own_line)
        .map(|nl| Span::new(line_start, nl + newline_len(source, nl)));

    if index + 1 < entries.len() {
        if let Some(line) = whole_line {
            return Edit::delete(line);
        }
        if let Some(nl) = tail {
            return Edit::delete(Span::new(indent_start(source, target.span.start), nl));
        }
        let rest = &source[own_end..];
        let spaces = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        return Edit::delete(Span::new(target.span.start, own_end + spaces));
    }

    if index > 0 {
        let prev = &entries[index - 1];
        let Some(prev_comma) = prev.comma else {
            return Edit::delete(Span::new(prev.span.end, own_end));
        };

        if target.comma.is_some() {
            // Trailing-comma style: the predecessor keeps its comma.
            return Edit::delete(whole_line.unwrap_or_else(|| {
                Span::new(indent_start(source, target.span.start), own_end)
            }));
        }

        // Drop the predecessor's comma but keep whatever followed it.
        let (kept_end, end) = if own_line {
            (line_break_before(source, line_start), tail.unwrap_or(own_end))
        } else {
            (indent_start(source, target.span.start), own_end)
        };
        return Edit::replace(
            Span::new(prev_comma.start, end),
            &source[prev_comma.end..kept_end],
        );
    }

    // Sole entry: collapse to `[]` when nothing but whitespace would be left.
    let inner = list.inner;
    let blank = is_blank(&source[inner.start..target.span.start])
        && is_blank(&source[own_end..inner.end]);
    if blank {
        Edit::replace(inner, "")
    } else {
        Edit::delete(whole_line.unwrap_or(Span::new(target.span.start, own_end)))
    }
}

/// Where the line continuing at `from` breaks, if only whitespace and
/// comments are left on it. Points at the `\r\n` or `\n`.
fn line_tail(source: &str, from: usize) -> Option<usize> {
    let mut idx = from;
    loop {
        let rest = &source[idx..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        idx += rest.len() - trimmed.len();

        if trimmed.is_empty() || trimmed.starts_with(['\r', '\n']) {
            return Some(idx);
        }
        if trimmed.starts_with("//") {
            return Some(idx + trimmed.find(['\r', '\n']).unwrap_or(trimmed.len()));
        }
        let body = trimmed.strip_prefix("/*")?;
        let close = body.find("*/")?;
        if body[..close].contains('\n') {
            return None;
        }
        idx += close + 4;
    }
}

fn line_start(source: &str, pos: usize) -> usize {
    source[..pos].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

/// Position of the line break ending the line before `line_start`.
fn line_break_before(source: &str, line_start: usize) -> usize {
    let before = &source[..line_start];
    before.len() - before.len().min(if before.ends_with("\r\n") { 2 } else { 1 })
}

fn newline_len(source: &str, at: usize) -> usize {
    let rest = &source[at..];
    if rest.starts_with("\r\n") {
        2
    } else if rest.starts_with('\n') {
        1
    } else {
        0
    }
}

/// Start of the spaces and tabs directly before `pos`.
fn indent_start(source: &str, pos: usize) -> usize {
    source[..pos].trim_end_matches([' ', '\t']).len()
}

fn indentation(source: &str, pos: usize) -> &str {
    let line = &source[line_start(source, pos)..pos];
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
