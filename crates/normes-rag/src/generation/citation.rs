//! Citation formatting: raw source identifiers to a Markdown sources block

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Heading that opens a sources block
pub const SOURCES_HEADING: &str = "**Sources:**";

/// Group source identifiers by file and render them as a Markdown list
///
/// Identifiers look like `path/to/file.pdf:12:3`. The basename of the path is
/// shown in bold, followed by its distinct page numbers in ascending order.
/// Empty or malformed identifiers are skipped. Returns an empty string when
/// nothing valid remains, otherwise a block starting with a blank line.
pub fn format_sources_as_markdown<I, S>(source_ids: I) -> String
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut file_pages: BTreeMap<String, BTreeSet<PageNumber>> = BTreeMap::new();

    for source_id in source_ids.into_iter().flatten() {
        let source_id = source_id.as_ref();
        if source_id.is_empty() {
            continue;
        }

        let mut parts = source_id.split(':');
        let path = parts.next().unwrap_or_default();
        let filename = basename(path);
        if filename.is_empty() {
            continue;
        }

        let pages = file_pages.entry(filename.to_string()).or_default();
        if let Some(page) = parts.next().and_then(parse_page) {
            pages.insert(page);
        }
    }

    if file_pages.is_empty() {
        return String::new();
    }

    let lines: Vec<String> = file_pages
        .iter()
        .map(|(filename, pages)| {
            let page_list = pages
                .iter()
                .map(PageNumber::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            match pages.len() {
                0 => format!("* **{}**", filename),
                1 => format!("* **{}**, page *{}*", filename, page_list),
                _ => format!("* **{}**, pages *{}*", filename, page_list),
            }
        })
        .collect();

    format!("\n\n{}\n{}", SOURCES_HEADING, lines.join("\n"))
}

/// Sources block for an answer built from an uploaded document
///
/// Index sources, when present, follow under a "supplementary" heading.
pub fn format_upload_sources(section_count: usize, index_sources: &str) -> String {
    let mut block = format!(
        "\n\n{}\n* **Document téléchargé** ({} sections analysées)",
        SOURCES_HEADING, section_count
    );

    if !index_sources.is_empty() {
        block.push('\n');
        block.push_str(&index_sources.replace(SOURCES_HEADING, "**Sources supplémentaires:**"));
    }

    block
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Page number of any length, kept as its digits without leading zeros
#[derive(Debug, Clone, PartialEq, Eq)]
struct PageNumber(String);

impl Ord for PageNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for PageNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_page(field: &str) -> Option<PageNumber> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = field.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    Some(PageNumber(digits.to_string()))
}
