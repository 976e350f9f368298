//! Preference Types
//!
//! The typed, fully-populated preference snapshot handed to every stage of a
//! request. `Default` is the compiled-in default set.

use serde::{Deserialize, Serialize};

/// Category names accepted by the preference store.
pub const CATEGORIES: [&str; 5] = ["general", "llm", "citation", "integration", "privacy"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    PlainText,
    Pdf,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Minimal,
    Standard,
    Detailed,
}

impl Verbosity {
    /// Word ceiling for a generated brief.
    pub fn brief_word_limit(&self) -> u32 {
        match self {
            Verbosity::Minimal => 200,
            Verbosity::Standard => 400,
            Verbosity::Detailed => 700,
        }
    }
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verbosity::Minimal => write!(f, "minimal"),
            Verbosity::Standard => write!(f, "standard"),
            Verbosity::Detailed => write!(f, "detailed"),
        }
    }
}

/// Citation style used when normalizing citations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationFormat {
    Bluebook,
    Apa,
    Mla,
    Chicago,
}

impl std::fmt::Display for CitationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CitationFormat::Bluebook => write!(f, "bluebook"),
            CitationFormat::Apa => write!(f, "apa"),
            CitationFormat::Mla => write!(f, "mla"),
            CitationFormat::Chicago => write!(f, "chicago"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralPreferences {
    pub output_format: OutputFormat,
    pub language: String,
    pub verbosity_level: Verbosity,
    pub auto_generate_brief: bool,
    pub save_analysis_history: bool,
}

impl Default for GeneralPreferences {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::PlainText,
            language: "en".to_string(),
            verbosity_level: Verbosity::Standard,
            auto_generate_brief: false,
            save_analysis_history: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmPreferences {
    /// Provider tried first
    pub primary_model: String,
    /// Provider tried when the primary fails
    pub fallback_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub enable_fallback: bool,
}

impl Default for LlmPreferences {
    fn default() -> Self {
        Self {
            primary_model: "gemini".to_string(),
            fallback_model: "ollama".to_string(),
            temperature: 0.7,
            max_tokens: 8192,
            enable_fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationPreferences {
    pub format: CitationFormat,
    pub include_citations_in_brief: bool,
    pub normalize_citations: bool,
}

impl Default for CitationPreferences {
    fn default() -> Self {
        Self {
            format: CitationFormat::Bluebook,
            include_citations_in_brief: true,
            normalize_citations: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegalApiPreferences {
    pub courtlistener_enabled: bool,
    pub courtlistener_api_key: String,
    pub caselaw_access_enabled: bool,
    pub caselaw_access_api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDestinations {
    pub local_download: bool,
    pub google_drive: bool,
    pub dropbox: bool,
}

impl Default for ExportDestinations {
    fn default() -> Self {
        Self {
            local_download: true,
            google_drive: false,
            dropbox: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationPreferences {
    pub legal_apis: LegalApiPreferences,
    pub export_destinations: ExportDestinations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyPreferences {
    pub store_documents: bool,
    pub store_analysis_results: bool,
    pub anonymize_data: bool,
}

impl Default for PrivacyPreferences {
    fn default() -> Self {
        Self {
            store_documents: false,
            store_analysis_results: true,
            anonymize_data: false,
        }
    }
}

/// Complete preference snapshot for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSet {
    pub general: GeneralPreferences,
    pub llm: LlmPreferences,
    pub citation: CitationPreferences,
    pub integration: IntegrationPreferences,
    pub privacy: PrivacyPreferences,
}

impl PreferenceSet {
    /// Range and shape checks that serde alone cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err("llm.max_tokens must be greater than 0".to_string());
        }
        if self.llm.primary_model.trim().is_empty() {
            return Err("llm.primary_model must not be empty".to_string());
        }
        if self.llm.fallback_model.trim().is_empty() {
            return Err("llm.fallback_model must not be empty".to_string());
        }
        if self.general.language.trim().is_empty() {
            return Err("general.language must not be empty".to_string());
        }
        Ok(())
    }

    /// Compact JSON used when a prompt needs to describe the preferences.
    pub fn prompt_summary(&self) -> String {
        serde_json::json!({
            "auto_generate_brief": self.general.auto_generate_brief,
            "verbosity_level": self.general.verbosity_level,
            "language": self.general.language,
            "citation_format": self.citation.format,
            "normalize_citations": self.citation.normalize_citations,
            "include_citations_in_brief": self.citation.include_citations_in_brief,
        })
        .to_string()
    }
}
