//! Citation Normalizer
//!
//! Deterministic rewriting of legal citations into one of the supported
//! citation styles. Each citation is matched against case, constitutional,
//! statute and journal patterns in that order; anything unrecognized is
//! passed through unchanged and reported, never dropped.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::services::preferences::CitationFormat;

/// What a citation was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    Case,
    Constitutional,
    Statute,
    Journal,
    Unknown,
}

impl CitationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationKind::Case => "case",
            CitationKind::Constitutional => "constitutional",
            CitationKind::Statute => "statute",
            CitationKind::Journal => "journal",
            CitationKind::Unknown => "unknown",
        }
    }
}

/// One normalized citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCitation {
    pub original: String,
    pub normalized: String,
    pub kind: CitationKind,
    pub confidence: f64,
}

impl NormalizedCitation {
    pub fn is_recognized(&self) -> bool {
        self.kind != CitationKind::Unknown
    }
}

struct CompiledPattern {
    kind: CitationKind,
    regex: Regex,
}

/// Patterns in matching order.
fn citation_patterns() -> &'static Vec<CompiledPattern> {
    static PATTERNS: OnceLock<Vec<CompiledPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let raw: [(CitationKind, &str); 4] = [
            (
                CitationKind::Case,
                r"^(?P<plaintiff>.+?)\s+[vV][sS]?\.?\s+(?P<defendant>.+?),?\s+(?P<volume>\d+)\s+(?P<reporter>[A-Za-z][A-Za-z0-9.\s]*?)\s+(?P<page>\d+)(?:,\s*\d+(?:-\d+)?)?(?:\s*\((?P<paren>[^)]*)\))?\.?$",
            ),
            (
                CitationKind::Constitutional,
                r"^(?i:U\.\s?S\.|United\s+States)\s+(?i:Const(?:\.|itution)?),?\s+(?P<article>(?i:art(?:icle)?|amend(?:ment)?))\.?\s+(?P<numeral>[IVXLCivxlc]+)\b(?P<rest>.*)$",
            ),
            (
                CitationKind::Statute,
                r"^(?P<title>\d+)\s+(?P<code>[A-Za-z][A-Za-z.\s]*?)\s*(?:§§?|(?i:sec(?:tion|\.)?))\s*(?P<section>\d+[A-Za-z0-9.\-()]*)(?:\s*\((?P<year>\d{4})\))?\.?$",
            ),
            (
                CitationKind::Journal,
                r"^(?P<author>[^,]+),\s*(?P<title>[^,]+),\s*(?P<volume>\d+)\s+(?P<journal>[A-Za-z][A-Za-z.\s&']*?)\s+(?P<page>\d+)(?:,\s*\d+(?:-\d+)?)?(?:\s*\((?P<year>\d{4})\))?\.?$",
            ),
        ];
        raw.into_iter()
            .filter_map(|(kind, pattern)| {
                Regex::new(pattern)
                    .ok()
                    .map(|regex| CompiledPattern { kind, regex })
            })
            .collect()
    })
}

fn year_pattern() -> Option<&'static Regex> {
    static YEAR: OnceLock<Option<Regex>> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\b(1[6-9]\d{2}|20\d{2})\b").ok())
        .as_ref()
}

/// Reporter abbreviations keyed by their lowercase, space-free spelling.
const REPORTERS: &[(&str, &str)] = &[
    ("u.s", "U.S."),
    ("s.ct", "S. Ct."),
    ("l.ed", "L. Ed."),
    ("l.ed.2d", "L. Ed. 2d"),
    ("f", "F."),
    ("f.2d", "F.2d"),
    ("f.3d", "F.3d"),
    ("f.4th", "F.4th"),
    ("f.supp", "F. Supp."),
    ("f.supp.2d", "F. Supp. 2d"),
    ("f.supp.3d", "F. Supp. 3d"),
];

/// Rewrites citations into a target style.
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationNormalizer;

impl CitationNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a single citation.
    pub fn normalize_one(&self, citation: &str, format: CitationFormat) -> NormalizedCitation {
        let cleaned = collapse_whitespace(citation);
        for pattern in citation_patterns() {
            if let Some(caps) = pattern.regex.captures(&cleaned) {
                let (normalized, confidence) = match pattern.kind {
                    CitationKind::Case => format_case(&caps, format),
                    CitationKind::Constitutional => format_constitutional(&caps, format),
                    CitationKind::Statute => format_statute(&caps, format),
                    CitationKind::Journal => format_journal(&caps, format),
                    CitationKind::Unknown => continue,
                };
                return NormalizedCitation {
                    original: citation.to_string(),
                    normalized,
                    kind: pattern.kind,
                    confidence,
                };
            }
        }

        NormalizedCitation {
            original: citation.to_string(),
            normalized: citation.to_string(),
            kind: CitationKind::Unknown,
            confidence: 0.0,
        }
    }

    /// Normalize a list of citations. Returns the task payload and one
    /// validation message per unrecognized citation.
    pub fn normalize(&self, citations: &[String], format: CitationFormat) -> (Value, Vec<String>) {
        let mut normalized = Vec::with_capacity(citations.len());
        let mut errors = Vec::new();

        for citation in citations.iter().filter(|c| !c.trim().is_empty()) {
            let entry = self.normalize_one(citation, format);
            if !entry.is_recognized() {
                errors.push(format!(
                    "unrecognized citation left unchanged: {}",
                    citation
                ));
            }
            normalized.push(entry);
        }

        let strings: Vec<&str> = normalized.iter().map(|c| c.normalized.as_str()).collect();
        let payload = json!({
            "normalized_citations": normalized,
            "citations": strings,
            "format": format.to_string(),
            "total_processed": normalized.len(),
        });
        (payload, errors)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map(|m| m.as_str().trim()).unwrap_or("")
}

fn standard_reporter(reporter: &str) -> String {
    let key: String = reporter
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let key = key.trim_end_matches('.');
    REPORTERS
        .iter()
        .find(|(abbrev, _)| *abbrev == key)
        .map(|(_, standard)| standard.to_string())
        .unwrap_or_else(|| collapse_whitespace(reporter))
}

/// Split a case parenthetical such as "9th Cir. 1995" into court and year.
fn split_court_year(paren: &str) -> (String, Option<String>) {
    let year = year_pattern()
        .and_then(|re| re.find_iter(paren).last())
        .map(|m| (m.start(), m.as_str().to_string()));
    match year {
        Some((start, year)) => {
            let court = paren[..start].trim().trim_end_matches(',').trim().to_string();
            (court, Some(year))
        }
        None => (paren.trim().to_string(), None),
    }
}

/// Fraction of required components present, plus 0.1 when a year was found.
fn component_confidence(required: &[&str], year: Option<&str>) -> f64 {
    if required.is_empty() {
        return 0.0;
    }
    let found = required.iter().filter(|c| !c.is_empty()).count() as f64;
    let bonus = if year.is_some() { 0.1 } else { 0.0 };
    (found / required.len() as f64 + bonus).min(1.0)
}

fn format_case(caps: &Captures<'_>, format: CitationFormat) -> (String, f64) {
    let plaintiff = group(caps, "plaintiff");
    let defendant = group(caps, "defendant").trim_end_matches(',');
    let volume = group(caps, "volume");
    let page = group(caps, "page");
    let reporter = standard_reporter(group(caps, "reporter"));
    let (court, year) = split_court_year(group(caps, "paren"));

    let normalized = match format {
        CitationFormat::Mla => {
            let mut out = format!(
                "{} v. {}. {}, vol. {}",
                plaintiff, defendant, reporter, volume
            );
            if let Some(year) = &year {
                out.push_str(&format!(", {}", year));
            }
            out.push_str(&format!(", p. {}", page));
            out
        }
        CitationFormat::Bluebook | CitationFormat::Apa | CitationFormat::Chicago => {
            let paren = [court.as_str(), year.as_deref().unwrap_or("")]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ");
            let mut out = format!(
                "{} v. {}, {} {} {}",
                plaintiff, defendant, volume, reporter, page
            );
            if !paren.is_empty() {
                out.push_str(&format!(" ({})", paren));
            }
            out
        }
    };

    let confidence = component_confidence(
        &[plaintiff, defendant, volume, reporter.as_str(), page],
        year.as_deref(),
    );
    (normalized, confidence)
}

fn format_constitutional(caps: &Captures<'_>, format: CitationFormat) -> (String, f64) {
    let article = group(caps, "article").to_lowercase();
    let label = if article.starts_with("art") { "art." } else { "amend." };
    let numeral = group(caps, "numeral").to_uppercase();
    let rest = group(caps, "rest").trim_end_matches('.');

    let mut provision = format!("{} {}", label, numeral);
    if !rest.is_empty() {
        if !rest.starts_with(',') {
            provision.push(' ');
        }
        provision.push_str(rest);
    }

    let normalized = match format {
        CitationFormat::Bluebook => format!("U.S. Const. {}", provision),
        CitationFormat::Apa | CitationFormat::Mla | CitationFormat::Chicago => {
            format!("U.S. Constitution, {}", provision)
        }
    };
    let confidence = component_confidence(&[label, numeral.as_str()], None);
    (normalized, confidence)
}

fn format_statute(caps: &Captures<'_>, format: CitationFormat) -> (String, f64) {
    let title = group(caps, "title");
    let code = collapse_whitespace(group(caps, "code"));
    let section = group(caps, "section");
    let year = caps.name("year").map(|m| m.as_str());

    let mut normalized = match format {
        CitationFormat::Mla => format!("{}, title {}, sec. {}", code, title, section),
        CitationFormat::Bluebook | CitationFormat::Apa | CitationFormat::Chicago => {
            format!("{} {} § {}", title, code, section)
        }
    };
    if let Some(year) = year {
        normalized.push_str(&format!(" ({})", year));
    }

    let confidence = component_confidence(&[title, code.as_str(), section], year);
    (normalized, confidence)
}

fn format_journal(caps: &Captures<'_>, format: CitationFormat) -> (String, f64) {
    let author = group(caps, "author");
    let title = group(caps, "title");
    let volume = group(caps, "volume");
    let journal = collapse_whitespace(group(caps, "journal"));
    let page = group(caps, "page");
    let year = caps.name("year").map(|m| m.as_str());
    let year_paren = year.map(|y| format!(" ({})", y)).unwrap_or_default();

    let normalized = match format {
        CitationFormat::Bluebook => format!(
            "{}, {}, {} {} {}{}",
            author, title, volume, journal, page, year_paren
        ),
        CitationFormat::Apa => format!(
            "{}{}. {}. {}, {}, {}",
            author, year_paren, title, journal, volume, page
        ),
        CitationFormat::Mla => format!(
            "{}. \"{}.\" {} {}{}: {}",
            author, title, journal, volume, year_paren, page
        ),
        CitationFormat::Chicago => format!(
            "{}, \"{},\" {} {}{}: {}",
            author, title, journal, volume, year_paren, page
        ),
    };

    let confidence =
        component_confidence(&[author, title, volume, journal.as_str(), page], year);
    (normalized, confidence)
}
