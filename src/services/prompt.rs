//! Prompt Template Store
//!
//! Named prompt templates with `{name}` placeholders, loaded once and read-only
//! afterwards. `{{` and `}}` render as literal braces. Reloading means building
//! a new store; nothing mutates a store in place.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use lexbrief_core::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::utils::error::{AppError, AppResult};

/// Template used by the model-assisted planner.
pub const ORCHESTRATION: &str = "orchestration";
/// Template used by the extraction task.
pub const LEGAL_EXTRACTION: &str = "legal_extraction";
/// Template used by the brief task.
pub const BRIEF_GENERATION: &str = "brief_generation";
/// Appended to a prompt when a response could not be parsed the first time.
pub const STRICT_JSON_SUFFIX: &str = "strict_json_suffix";

/// Every key a task may ask for.
pub const REQUIRED_KEYS: [&str; 4] = [
    ORCHESTRATION,
    LEGAL_EXTRACTION,
    BRIEF_GENERATION,
    STRICT_JSON_SUFFIX,
];

/// A single named template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub key: String,
    pub template: String,
}

impl PromptTemplate {
    pub fn new(key: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            template: template.into(),
        }
    }

    /// Names of the placeholders this template references.
    pub fn placeholders(&self) -> PipelineResult<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for segment in parse_segments(&self.key, &self.template)? {
            if let Segment::Placeholder(name) = segment {
                names.insert(name.to_string());
            }
        }
        Ok(names)
    }

    /// Render with the given variables.
    pub fn render(&self, variables: &HashMap<&str, String>) -> PipelineResult<String> {
        let mut out = String::with_capacity(self.template.len());
        for segment in parse_segments(&self.key, &self.template)? {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Brace(c) => out.push(c),
                Segment::Placeholder(name) => match variables.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(PipelineError::template_format(
                            &self.key,
                            format!("missing variable '{}'", name),
                        ))
                    }
                },
            }
        }
        Ok(out)
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a template into literal text, escaped braces and placeholders.
fn parse_segments<'a>(key: &str, template: &'a str) -> PipelineResult<Vec<Segment<'a>>> {
    let bytes = template.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'}' if i + 1 < bytes.len() && bytes[i + 1] == bytes[i] => {
                if literal_start < i {
                    segments.push(Segment::Literal(&template[literal_start..i]));
                }
                segments.push(Segment::Brace(bytes[i] as char));
                i += 2;
                literal_start = i;
            }
            b'{' => {
                let close = template[i + 1..].find('}').map(|offset| i + 1 + offset);
                let Some(close) = close else {
                    return Err(PipelineError::template_format(
                        key,
                        format!("unclosed '{{' at byte {}", i),
                    ));
                };
                let name = &template[i + 1..close];
                if !is_placeholder_name(name) {
                    return Err(PipelineError::template_format(
                        key,
                        format!("invalid placeholder '{{{}}}'", name),
                    ));
                }
                if literal_start < i {
                    segments.push(Segment::Literal(&template[literal_start..i]));
                }
                segments.push(Segment::Placeholder(name));
                i = close + 1;
                literal_start = i;
            }
            b'}' => {
                return Err(PipelineError::template_format(
                    key,
                    format!("unmatched '}}' at byte {}", i),
                ));
            }
            _ => i += 1,
        }
    }
    if literal_start < bytes.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    Ok(segments)
}

/// Immutable set of prompt templates keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PromptStore {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptStore {
    /// Build a store from raw `key -> body` pairs, rejecting malformed templates.
    pub fn from_map(map: HashMap<String, String>) -> PipelineResult<Self> {
        let mut templates = HashMap::with_capacity(map.len());
        for (key, body) in map {
            let template = PromptTemplate::new(key.clone(), body);
            template
                .placeholders()
                .map_err(|e| PipelineError::config(e.to_string()))?;
            templates.insert(key, template);
        }
        Ok(Self { templates })
    }

    /// The compiled-in templates.
    pub fn builtin() -> Self {
        let templates = builtin_templates()
            .into_iter()
            .map(|(key, body)| (key.to_string(), PromptTemplate::new(key, body)))
            .collect();
        Self { templates }
    }

    /// Load a flat JSON object `{key: body}` layered over the built-in templates.
    pub fn load_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let map: HashMap<String, String> = serde_json::from_str(&content)?;
        let count = map.len();
        let loaded = Self::from_map(map)?;

        let mut store = Self::builtin();
        store.templates.extend(loaded.templates);
        info!(path = %path.display(), count, "Loaded prompt templates");
        Ok(store)
    }

    pub fn get(&self, key: &str) -> PipelineResult<&PromptTemplate> {
        self.templates
            .get(key)
            .ok_or_else(|| PipelineError::template_not_found(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    /// Format a template by key.
    pub fn format(&self, key: &str, variables: &HashMap<&str, String>) -> PipelineResult<String> {
        let rendered = self.get(key)?.render(variables)?;
        debug!(key, len = rendered.len(), "Formatted prompt");
        Ok(rendered)
    }

    /// Fail fast when a template a task depends on is missing.
    pub fn require(&self, keys: &[&str]) -> AppResult<()> {
        let missing: Vec<&str> = keys.iter().copied().filter(|k| !self.contains(k)).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::config(format!(
                "missing prompt templates: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

fn builtin_templates() -> Vec<(&'static str, &'static str)> {
    vec![
        (ORCHESTRATION, ORCHESTRATION_TEMPLATE),
        (LEGAL_EXTRACTION, LEGAL_EXTRACTION_TEMPLATE),
        (BRIEF_GENERATION, BRIEF_GENERATION_TEMPLATE),
        (STRICT_JSON_SUFFIX, STRICT_JSON_SUFFIX_TEMPLATE),
    ]
}

const ORCHESTRATION_TEMPLATE: &str = r#"You are the planner for a legal document analysis pipeline. Decide which tasks must run for the request below and in what order.

AVAILABLE TASKS:
{task_catalogue}

USER PREFERENCES:
{preferences}

REQUEST:
{request}

RULES:
- Every task must appear after all tasks it depends on.
- Do not list a task twice.
- Only list tasks from the catalogue.

Respond with a single JSON object and nothing else:
{{
    "analysis": "one or two sentences on what the request needs",
    "execution_sequence": ["extract", "..."],
    "confidence": 0.0
}}
"#;

const LEGAL_EXTRACTION_TEMPLATE: &str = r#"You are a legal document analyst. Read the document and extract its structured details.

FIELDS:
- case_name: full case name with parties (e.g. "Smith v. Jones")
- court: court name and jurisdiction
- date: date of the judgment or decision
- judges: judges or justices on the panel
- case_number: docket or case number
- facts: key factual background in two or three sentences
- legal_issues: the legal questions presented
- holdings: the court's rulings
- reasoning: the main points of the court's reasoning
- citations: every case citation and statutory or constitutional reference
- disposition: the final outcome

Respond in {language}. Use "Not found" for any field the document does not contain. Copy citations exactly as written.

DOCUMENT:
{document_text}

Respond with a single JSON object:
{{
    "case_name": "...",
    "court": "...",
    "date": "...",
    "judges": ["..."],
    "case_number": "...",
    "facts": "...",
    "legal_issues": ["..."],
    "holdings": ["..."],
    "reasoning": ["..."],
    "citations": ["..."],
    "disposition": "...",
    "confidence": 0.0
}}
"#;

const BRIEF_GENERATION_TEMPLATE: &str = r#"You are a legal summarization assistant. Draft a short brief (at most {max_words} words) from the extracted case data below.

Verbosity: {verbosity}. Language: {language}. Citation style: {citation_format}.
{citation_instruction}

EXTRACTED CASE DATA:
Case name: {case_name}
Court: {court}
Date: {date}
Facts: {facts}
Legal issues: {legal_issues}
Holdings: {holdings}
Reasoning: {reasoning}
Citations: {citations}
Disposition: {disposition}

Respond with a single JSON object:
{{
    "issue": "...",
    "facts": "...",
    "holding": "...",
    "reasoning": ["..."],
    "key_citations": ["..."],
    "word_count": 0,
    "confidence_score": 0
}}
"#;

const STRICT_JSON_SUFFIX_TEMPLATE: &str = "\n\nIMPORTANT: Your previous answer could not be parsed. Reply with exactly one valid JSON object. No markdown fences, no commentary, no trailing text.";
