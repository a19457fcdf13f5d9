//! Pure matching helpers for problem-reference resolution.
//!
//! The resolver in the application layer owns the catalog fetches; everything
//! here is deterministic string work: recognizing what form an identifier
//! takes (URL, number, numbered title, free text) and scoring candidate
//! catalog entries against it. Failures are modeled as `None`, never panics.

use once_cell::sync::Lazy;
use regex::Regex;

use super::problem::CatalogEntry;

/// Matches a problem URL and captures its slug.
static PROBLEM_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"leetcode\.com/problems/([A-Za-z0-9\-_]+)").unwrap());

/// Matches a `"<number>. <title>"` or `"<number>) <title>"` identifier.
static NUMBERED_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,6})\s*[.)]\s*(\S.*)$").unwrap());

/// Fuzzy matching is skipped when the normalized identifier is shorter than
/// this and has fewer than [`MIN_FUZZY_WORDS`] words.
pub const MIN_FUZZY_CHARS: usize = 4;
/// See [`MIN_FUZZY_CHARS`].
pub const MIN_FUZZY_WORDS: usize = 3;

/// How many leading lines of a pasted blob are scanned for a numbered title.
const PASTE_SCAN_LINES: usize = 5;
/// Minimum length before input is treated as a pasted blob.
const PASTE_MIN_LEN: usize = 80;

/// The syntactic form of a user-supplied identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierForm {
    /// A known URL path containing the catalog slug.
    UrlSlug(String),
    /// Purely numeric, optionally with trailing punctuation ("42", "42.").
    Numeric(u32),
    /// `"<number>. <title>"`.
    NumberedTitle { number: u32, title: String },
    /// Anything else.
    Free,
}

/// Determines the syntactic form of an identifier.
pub fn parse_identifier(input: &str) -> IdentifierForm {
    if let Some(caps) = PROBLEM_URL_RE.captures(input) {
        return IdentifierForm::UrlSlug(caps[1].to_string());
    }

    let trimmed = input.trim();
    let bare = trimmed.trim_end_matches(['.', ',', '!', '?', ')']);
    if !bare.is_empty() && bare.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(number) = bare.parse::<u32>() {
            return IdentifierForm::Numeric(number);
        }
    }

    if let Some(caps) = NUMBERED_TITLE_RE.captures(trimmed) {
        if let Ok(number) = caps[1].parse::<u32>() {
            return IdentifierForm::NumberedTitle {
                number,
                title: caps[2].trim().to_string(),
            };
        }
    }

    IdentifierForm::Free
}

/// Lower-cases, strips accents, and collapses whitespace runs.
pub fn normalize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = true;
    for c in input.chars().flat_map(char::to_lowercase).map(fold_accent) {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Folds common accented Latin characters to their ASCII base.
fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}

/// How confident a catalog match is. Ordered ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchConfidence {
    /// Title containment only.
    Fuzzy,
    /// Sequence number matched but the title portion did not.
    NumberOnly,
    /// Sequence number matched and the title portion confirmed it.
    TitleConfirmed,
    /// Exact slug, number, or normalized-title match.
    Exact,
}

/// A scored candidate from the catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogMatch<'a> {
    pub entry: &'a CatalogEntry,
    pub confidence: MatchConfidence,
}

/// Cheap pre-check deciding whether resolution should be attempted at all.
///
/// Plain chat ("hi", "explain recursion") must not trigger a catalog fetch.
pub fn looks_like_reference(input: &str) -> bool {
    match parse_identifier(input) {
        IdentifierForm::Free => {}
        _ => return true,
    }
    if input.to_lowercase().contains("leetcode") {
        return true;
    }
    is_paste(input) && extract_pasted_reference(input).is_some()
}

/// Applies the strategy ladder against an already-fetched listing.
///
/// Strategy order: numeric id, numbered title (with a number-only fallback
/// kept when the title portion mismatches), fuzzy title, pasted-text scan.
/// The URL form never reaches here; the resolver short-circuits on it.
pub fn best_match<'a>(identifier: &str, entries: &'a [CatalogEntry]) -> Option<CatalogMatch<'a>> {
    match parse_identifier(identifier) {
        IdentifierForm::UrlSlug(slug) => entries
            .iter()
            .find(|e| e.slug == slug)
            .map(|entry| CatalogMatch {
                entry,
                confidence: MatchConfidence::Exact,
            }),
        IdentifierForm::Numeric(number) => entries
            .iter()
            .find(|e| e.id == number)
            .map(|entry| CatalogMatch {
                entry,
                confidence: MatchConfidence::Exact,
            }),
        IdentifierForm::NumberedTitle { number, title } => {
            match_numbered_title(number, &title, entries)
        }
        IdentifierForm::Free => {
            if is_paste(identifier) {
                if let Some((number, title)) = extract_pasted_reference(identifier) {
                    return match_numbered_title(number, &title, entries);
                }
            }
            match_fuzzy_title(identifier, entries)
        }
    }
}

/// Strategy 3: match on number, confirm loosely on title.
///
/// A numeric hit with a mismatched title is kept as a lower-confidence
/// fallback; a fuzzy title match beats it, nothing at all loses to it.
pub fn match_numbered_title<'a>(
    number: u32,
    title: &str,
    entries: &'a [CatalogEntry],
) -> Option<CatalogMatch<'a>> {
    let numeric_hit = entries.iter().find(|e| e.id == number);

    if let Some(entry) = numeric_hit {
        if titles_agree(title, &entry.title) {
            return Some(CatalogMatch {
                entry,
                confidence: MatchConfidence::TitleConfirmed,
            });
        }
    }

    if let Some(fuzzy) = match_fuzzy_title(title, entries) {
        return Some(fuzzy);
    }

    numeric_hit.map(|entry| CatalogMatch {
        entry,
        confidence: MatchConfidence::NumberOnly,
    })
}

/// Loose title confirmation: one normalized title contains the other.
fn titles_agree(supplied: &str, catalog: &str) -> bool {
    let supplied = normalize_text(supplied);
    let catalog = normalize_text(catalog);
    !supplied.is_empty() && (catalog.contains(&supplied) || supplied.contains(&catalog))
}

/// Strategy 4: normalized equality first, then containment scored by
/// matched-title length. Skipped for identifiers too short to be meaningful.
pub fn match_fuzzy_title<'a>(
    identifier: &str,
    entries: &'a [CatalogEntry],
) -> Option<CatalogMatch<'a>> {
    let norm = normalize_text(identifier);
    let words = norm.split(' ').filter(|w| !w.is_empty()).count();
    if norm.chars().count() < MIN_FUZZY_CHARS && words < MIN_FUZZY_WORDS {
        return None;
    }

    let mut best: Option<(&CatalogEntry, usize)> = None;
    for entry in entries {
        let entry_norm = normalize_text(&entry.title);
        if entry_norm.is_empty() {
            continue;
        }
        if entry_norm == norm {
            return Some(CatalogMatch {
                entry,
                confidence: MatchConfidence::Exact,
            });
        }
        if norm.contains(&entry_norm) {
            let score = entry_norm.chars().count();
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((entry, score));
            }
        }
    }

    best.map(|(entry, _)| CatalogMatch {
        entry,
        confidence: MatchConfidence::Fuzzy,
    })
}

/// Strategy 5: scan the first few lines of a pasted blob for a numbered title.
pub fn extract_pasted_reference(input: &str) -> Option<(u32, String)> {
    for line in input.lines().take(PASTE_SCAN_LINES) {
        if let Some(caps) = NUMBERED_TITLE_RE.captures(line.trim()) {
            if let Ok(number) = caps[1].parse::<u32>() {
                return Some((number, caps[2].trim().to_string()));
            }
        }
    }
    None
}

fn is_paste(input: &str) -> bool {
    input.contains('\n') && input.len() > PASTE_MIN_LEN
}
