//! Boilerplate and artifact removal for raw document text
//!
//! Standards PDFs carry licensing blocks, dotted table-of-contents leaders and
//! stray markup that add noise to a comparison prompt. The normalizer strips
//! them before raw document text is placed in a prompt.

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static DOT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").expect("valid regex"));

static SPACED_DOTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\s+\.\s+\.\s+\.+").expect("valid regex"));

static IEC_COPYRIGHT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)THIS PUBLICATION IS COPYRIGHT PROTECTED.*?Copyright © .*?IEC, Geneva, Switzerland.*?All rights reserved.*?Droits de reproduction réservés.*?IEC Central Office.*?www\.iec\.ch",
    )
    .expect("valid regex")
});

static IEC_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Tel\.: \+41 22 919 02 11").expect("valid regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Ordered markers of a per-customer licence stamp
///
/// The stamp is only removed when every marker appears, in this order,
/// starting from an occurrence of the first one.
static LICENCE_STAMP_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Customer:",
        r"(?i)No\.\s+of\s+User\(s\):\s*\d+",
        r"(?i)Company:\s*CHAUVIN\s+ARNOUX",
        r"(?i)Order\s+No\.:\s*",
        r"(?i)copyright\s+of\s+IEC,\s+Geneva,\s+Switzerland",
        r"(?i)All\s+rights\s+reserved",
        r"(?i)licence\s+agreement",
        r"(?i)custserv@iec\.ch",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

/// Cleans raw document text for direct inclusion in a prompt
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentNormalizer;

impl DocumentNormalizer {
    /// Create a normalizer
    pub fn new() -> Self {
        Self
    }

    /// Clean `text` until no rule changes it any more
    ///
    /// Entities are fully decoded before the other rules run, so one pass is
    /// stable for ordinary input. Removing a block can still join fragments
    /// into a new match, which a later pass picks up; passes are capped at
    /// `MAX_PASSES`.
    pub fn clean(&self, text: &str) -> String {
        let mut current = clean_once(text);
        for _ in 1..MAX_PASSES {
            let next = clean_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

const MAX_PASSES: usize = 4;

/// Longest entity reference considered for decoding, in bytes
const MAX_ENTITY_LEN: usize = 40;

fn clean_once(text: &str) -> String {
    let cleaned = decode_entities(text);
    let cleaned = HTML_TAG.replace_all(&cleaned, "");
    let cleaned = DOT_RUN.replace_all(&cleaned, " ");
    let cleaned = SPACED_DOTS.replace_all(&cleaned, " ");

    let cleaned = remove_licence_stamps(&cleaned);

    let cleaned = IEC_COPYRIGHT.replace_all(&cleaned, "");
    let cleaned = IEC_PHONE.replace_all(&cleaned, "");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");

    cleaned.trim().to_string()
}

/// Decode every layer of entity references in one left-to-right walk
///
/// Each time a `;` lands at the end of the output, the reference starting at
/// the last `&` is decoded in place. A decoded `&` or `;` takes part in the
/// next reference, so `&amp;amp;lt;` ends up as `<`. Work per character is
/// bounded by `MAX_ENTITY_LEN`.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    for ch in text.chars() {
        output.push(ch);
        if ch == ';' {
            while decode_trailing_entity(&mut output) {}
        }
    }
    output
}

/// Replace a complete entity reference at the end of `output`
///
/// Returns `true` when the decoded text ends with `;` and may close another
/// reference.
fn decode_trailing_entity(output: &mut String) -> bool {
    let mut window = output.len().saturating_sub(MAX_ENTITY_LEN);
    while !output.is_char_boundary(window) {
        window += 1;
    }
    let Some(offset) = output[window..].rfind('&') else {
        return false;
    };
    let start = window + offset;

    let reference = &output[start..];
    if !is_entity_reference(reference) {
        return false;
    }
    let decoded = html_escape::decode_html_entities(reference);
    if decoded == reference {
        return false;
    }

    let decoded = decoded.into_owned();
    output.truncate(start);
    output.push_str(&decoded);
    decoded.ends_with(';')
}

/// `&name;`, `&#digits;` or `&#xhex;`
fn is_entity_reference(candidate: &str) -> bool {
    let Some(body) = candidate
        .strip_prefix('&')
        .and_then(|rest| rest.strip_suffix(';'))
    else {
        return false;
    };

    if let Some(numeric) = body.strip_prefix('#') {
        return match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !numeric.is_empty() && numeric.chars().all(|c| c.is_ascii_digit()),
        };
    }

    body.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && body.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Remove every complete licence stamp from `text`
///
/// Walks the text from left to right. At each occurrence of the first marker
/// the remaining markers are searched in order, each from the end of the
/// previous match. A complete sequence removes the span from the first
/// marker to the end of the last one; an incomplete one keeps the first
/// marker and resumes the scan just past it.
fn remove_licence_stamps(text: &str) -> String {
    let Some((first, rest)) = LICENCE_STAMP_MARKERS.split_first() else {
        return text.to_string();
    };

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    while cursor < text.len() {
        let Some(start) = first.find_at(text, cursor) else {
            output.push_str(&text[cursor..]);
            break;
        };

        output.push_str(&text[cursor..start.start()]);

        let mut block_end = Some(start.end());
        for marker in rest {
            block_end = block_end.and_then(|pos| marker.find_at(text, pos).map(|m| m.end()));
            if block_end.is_none() {
                break;
            }
        }

        match block_end {
            Some(end) => {
                tracing::debug!("Removed licence stamp spanning {} bytes", end - start.start());
                cursor = end;
            }
            None => {
                output.push_str(start.as_str());
                cursor = start.end();
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAMP: &str = "Customer: Jean Dupont No. of User(s): 1 Company: CHAUVIN ARNOUX \
        Order No.: WS-2021-001 IMPORTANT: This file is copyright of IEC, Geneva, Switzerland. \
        All rights reserved. This file is subject to a licence agreement. \
        Enquiries to Email: custserv@iec.ch";

    #[test]
    fn test_strips_tags_and_dot_leaders() {
        let cleaned = DocumentNormalizer::new().clean("<p>Domaine d'application</p>.......... 12");
        assert_eq!(cleaned, "Domaine d'application 12");
    }

    #[test]
    fn test_unescapes_entities_and_collapses_whitespace() {
        let cleaned = DocumentNormalizer::new().clean("Courant &amp; tension\n\n\t  nominale");
        assert_eq!(cleaned, "Courant & tension nominale");
    }

    #[test]
    fn test_removes_complete_licence_stamp() {
        let text = format!("Avant-propos {} 1 Domaine", STAMP);
        let cleaned = DocumentNormalizer::new().clean(&text);
        assert_eq!(cleaned, "Avant-propos 1 Domaine");
    }

    #[test]
    fn test_keeps_partial_licence_stamp() {
        let text = "Customer: support technique. Company: CHAUVIN ARNOUX";
        let cleaned = DocumentNormalizer::new().clean(text);
        assert_eq!(cleaned, text);
    }

    #[test]
    fn test_partial_stamp_before_complete_one() {
        let text = format!("Customer: note {}", STAMP);
        let cleaned = remove_licence_stamps(&text);
        // The first "Customer:" starts a complete sequence through the real stamp
        assert_eq!(cleaned, "");

        let text = format!("{} fin Customer: seul", STAMP);
        let cleaned = remove_licence_stamps(&text);
        assert_eq!(cleaned, " fin Customer: seul");
    }

    #[test]
    fn test_removes_iec_copyright_notice() {
        let text = "Préface THIS PUBLICATION IS COPYRIGHT PROTECTED\nCopyright © 2020 IEC, Geneva, Switzerland\n\
            All rights reserved. Droits de reproduction réservés.\nIEC Central Office\n3, rue de Varembé\n\
            Tel.: +41 22 919 02 11\nwww.iec.ch Contenu";
        let cleaned = DocumentNormalizer::new().clean(text);
        assert_eq!(cleaned, "Préface Contenu");
    }

    #[test]
    fn test_decodes_nested_entities() {
        assert_eq!(decode_entities("x &amp;amp;lt; y"), "x < y");
        assert_eq!(decode_entities("&am&#112;; fin"), "& fin");
        assert_eq!(decode_entities("R&D; &unknown; 5 &lt 6"), "R&D; &unknown; 5 &lt 6");
        assert_eq!(decode_entities("&#233;t&#xE9;"), "été");
    }

    #[test]
    fn test_deeply_nested_entities_clean_in_one_pass() {
        let input = format!("x &{}lt; y", "amp;".repeat(20_000));

        let decoded = decode_entities(&input);
        assert_eq!(decoded, "x < y");

        let start = std::time::Instant::now();
        let cleaned = DocumentNormalizer::new().clean(&input);
        assert_eq!(cleaned, "x < y");
        assert!(
            start.elapsed() < std::time::Duration::from_secs(2),
            "cleaning took {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn test_escaped_markup_is_stripped() {
        let cleaned = DocumentNormalizer::new()
            .clean("&amp;lt;b&amp;gt;Tension&amp;lt;/b&amp;gt; nominale");
        assert_eq!(cleaned, "Tension nominale");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let normalizer = DocumentNormalizer::new();
        let inputs = [
            "&lt;b&gt;gras&lt;/b&gt; . . . . texte",
            "&#46;&#46;&#46; points",
            "Tel.:  +41 22 919 02 11 reste",
            STAMP,
            "  Mesure   de\u{a0}puissance  ",
        ];

        for input in inputs {
            let once = normalizer.clean(input);
            assert_eq!(normalizer.clean(&once), once, "not idempotent for {:?}", input);
        }
    }
}
