//! Prompt construction and response parsing for the text-generation provider.

use serde::Deserialize;

use nerostack_domain::AnalysisLanguage;

use crate::GenerationRequest;

/// Appended to excerpts cut at the character budget.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// Characters of raw output kept as summary when the reply is not JSON.
pub const FALLBACK_SUMMARY_CHARS: usize = 500;

const ANALYSIS_SYSTEM_PROMPT_FR: &str = r#"Tu es un assistant spécialisé dans l'analyse de documents.
Analyse le document fourni et produis :
1. un résumé concis de 3 à 5 phrases
2. entre 5 et 10 mots-clés pertinents
3. les 3 à 5 points clés les plus importants

Réponds uniquement avec un JSON valide de la forme :
{
    "summary": "...",
    "keywords": ["...", "..."],
    "key_points": ["...", "..."]
}

N'écris rien avant ni après le JSON."#;

const ANALYSIS_SYSTEM_PROMPT_EN: &str = r#"You are an assistant specialised in document analysis.
Analyse the provided document and produce:
1. a concise summary of 3 to 5 sentences
2. between 5 and 10 relevant keywords
3. the 3 to 5 most important key points

Reply only with valid JSON shaped as:
{
    "summary": "...",
    "keywords": ["...", "..."],
    "key_points": ["...", "..."]
}

Write nothing before or after the JSON."#;

/// Cuts `content` to `max_chars` characters, appending [`TRUNCATION_MARKER`] when cut.
#[must_use]
pub fn excerpt(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{TRUNCATION_MARKER}", &content[..byte_index]),
        None => content.to_owned(),
    }
}

/// Full structured analysis request.
#[must_use]
pub fn analysis_request(excerpt: &str, language: AnalysisLanguage) -> GenerationRequest {
    let (system_prompt, lead) = match language {
        AnalysisLanguage::Fr => (ANALYSIS_SYSTEM_PROMPT_FR, "Analyse ce document :"),
        AnalysisLanguage::En => (ANALYSIS_SYSTEM_PROMPT_EN, "Analyse this document:"),
    };

    GenerationRequest {
        prompt: format!("{lead}\n\n{excerpt}"),
        system_prompt: Some(system_prompt.to_owned()),
    }
}

/// Summary-only request.
#[must_use]
pub fn summary_request(excerpt: &str, language: AnalysisLanguage) -> GenerationRequest {
    let prompt = match language {
        AnalysisLanguage::Fr => format!(
            "Rédige un résumé concis (3 à 5 phrases) de ce document :\n\n{excerpt}\n\nRésumé :"
        ),
        AnalysisLanguage::En => format!(
            "Write a concise summary (3 to 5 sentences) of this document:\n\n{excerpt}\n\nSummary:"
        ),
    };

    GenerationRequest {
        prompt,
        system_prompt: None,
    }
}

/// Comma-separated keyword request.
#[must_use]
pub fn keywords_request(excerpt: &str, count: usize, language: AnalysisLanguage) -> GenerationRequest {
    let prompt = match language {
        AnalysisLanguage::Fr => format!(
            "Donne les {count} mots-clés les plus importants de ce document.\n\
             Réponds seulement avec les mots-clés séparés par des virgules, sans numérotation.\n\n\
             Document :\n{excerpt}\n\nMots-clés :"
        ),
        AnalysisLanguage::En => format!(
            "List the {count} most important keywords of this document.\n\
             Reply only with the keywords separated by commas, without numbering.\n\n\
             Document:\n{excerpt}\n\nKeywords:"
        ),
    };

    GenerationRequest {
        prompt,
        system_prompt: None,
    }
}

/// Question-answering request.
#[must_use]
pub fn question_request(excerpt: &str, question: &str, language: AnalysisLanguage) -> GenerationRequest {
    let prompt = match language {
        AnalysisLanguage::Fr => format!(
            "En te basant sur le document suivant, réponds à la question.\n\n\
             Document :\n{excerpt}\n\nQuestion : {question}\n\nRéponse :"
        ),
        AnalysisLanguage::En => format!(
            "Using the following document, answer the question.\n\n\
             Document:\n{excerpt}\n\nQuestion: {question}\n\nAnswer:"
        ),
    };

    GenerationRequest {
        prompt,
        system_prompt: None,
    }
}

/// Analysis fields extracted from a provider reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnalysis {
    /// Summary text.
    pub summary: String,
    /// Ordered keywords.
    pub keywords: Vec<String>,
    /// Ordered key points.
    pub key_points: Vec<String>,
    /// Whether the reply was valid JSON.
    pub structured: bool,
}

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    key_points: Vec<String>,
}

fn strip_code_fence(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest.split("```").next().unwrap_or(rest);
        cleaned = cleaned.strip_prefix("json").unwrap_or(cleaned);
    }
    cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned);
    cleaned.trim()
}

/// Parses a structured reply, falling back to the leading raw text as summary.
#[must_use]
pub fn parse_analysis_response(raw: &str) -> ParsedAnalysis {
    match serde_json::from_str::<AnalysisPayload>(strip_code_fence(raw)) {
        Ok(payload) => ParsedAnalysis {
            summary: payload.summary,
            keywords: payload.keywords,
            key_points: payload.key_points,
            structured: true,
        },
        Err(_) => ParsedAnalysis {
            summary: raw.chars().take(FALLBACK_SUMMARY_CHARS).collect(),
            keywords: Vec::new(),
            key_points: Vec::new(),
            structured: false,
        },
    }
}

/// Splits a comma-separated reply into at most `count` non-empty keywords.
#[must_use]
pub fn parse_keywords(raw: &str, count: usize) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .take(count)
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_keeps_short_content_untouched() {
        assert_eq!(excerpt("short", 10), "short");
    }

    #[test]
    fn excerpt_cuts_on_char_boundary_and_marks() {
        let cut = excerpt("ééééé", 3);
        assert_eq!(cut, format!("ééé{TRUNCATION_MARKER}"));
    }

    #[test]
    fn fenced_json_reply_is_parsed() {
        let raw = "```json\n{\"summary\": \"S\", \"keywords\": [\"a\", \"b\"], \"key_points\": [\"p\"]}\n```";
        let parsed = parse_analysis_response(raw);

        assert!(parsed.structured);
        assert_eq!(parsed.summary, "S");
        assert_eq!(parsed.keywords, vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(parsed.key_points, vec!["p".to_owned()]);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let parsed = parse_analysis_response("{\"summary\": \"only\"}");
        assert!(parsed.structured);
        assert!(parsed.keywords.is_empty());
    }

    #[test]
    fn malformed_reply_falls_back_to_leading_text() {
        let raw = "x".repeat(FALLBACK_SUMMARY_CHARS + 40);
        let parsed = parse_analysis_response(&raw);

        assert!(!parsed.structured);
        assert_eq!(parsed.summary.chars().count(), FALLBACK_SUMMARY_CHARS);
        assert!(parsed.keywords.is_empty());
        assert!(parsed.key_points.is_empty());
    }

    #[test]
    fn keywords_are_trimmed_filtered_and_capped() {
        let keywords = parse_keywords(" invoice, ,supplier ,payment, due date", 3);
        assert_eq!(keywords, vec!["invoice", "supplier", "payment"]);
    }

    #[test]
    fn english_analysis_request_carries_system_prompt() {
        let request = analysis_request("body", AnalysisLanguage::En);
        assert!(request.prompt.ends_with("body"));
        assert!(request.system_prompt.is_some_and(|prompt| prompt.contains("valid JSON")));
    }
}
