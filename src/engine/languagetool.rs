//! [`GrammarEngine`] backed by a LanguageTool HTTP server.
//!
//! Talks to the public `/v2/check` endpoint: one form-encoded POST per call,
//! JSON back. Start a server locally with
//! `java -cp languagetool-server.jar org.languagetool.server.HTTPServer --port 8081`
//! or point [`crate::CorrectionConfig::languagetool_url`] at a hosted one.
//!
//! LanguageTool reports offsets in UTF-16 code units; they are converted to
//! `char` offsets here so the rest of the crate never sees UTF-16.

use super::{GrammarEngine, GrammarMatch};
use crate::error::CollaboratorError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const ENGINE: &str = "languagetool";

/// HTTP client for one LanguageTool server and one language.
#[derive(Debug, Clone)]
pub struct LanguageToolClient {
    http: reqwest::Client,
    check_url: String,
    language: String,
}

impl LanguageToolClient {
    /// Client for `base_url` (e.g. `http://localhost:8081`) checking `language`.
    ///
    /// `timeout_secs` bounds each HTTP request; the orchestrator applies its
    /// own per-call timeout on top.
    pub fn new(
        base_url: &str,
        language: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, CollaboratorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CollaboratorError::Unavailable {
                engine: ENGINE.into(),
                detail: e.to_string(),
            })?;
        Ok(Self {
            http,
            check_url: format!("{}/v2/check", base_url.trim_end_matches('/')),
            language: language.into(),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl GrammarEngine for LanguageToolClient {
    fn name(&self) -> &str {
        ENGINE
    }

    async fn check(&self, text: &str) -> Result<Vec<GrammarMatch>, CollaboratorError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .http
            .post(&self.check_url)
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()
            .await
            .map_err(|e| CollaboratorError::Unavailable {
                engine: ENGINE.into(),
                detail: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CollaboratorError::Protocol {
                engine: ENGINE.into(),
                detail: e.to_string(),
            })?;

        if status.is_client_error() {
            return Err(CollaboratorError::Rejected {
                engine: ENGINE.into(),
                detail: format!("HTTP {status}: {}", body.trim()),
            });
        }
        if !status.is_success() {
            return Err(CollaboratorError::Unavailable {
                engine: ENGINE.into(),
                detail: format!("HTTP {status}"),
            });
        }

        let matches = parse_check_response(text, &body)?;
        debug!("languagetool: {} matches for {} chars", matches.len(), text.len());
        Ok(matches)
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Deserialize)]
struct WireMatch {
    message: String,
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<WireReplacement>,
    rule: Option<WireRule>,
}

#[derive(Deserialize)]
struct WireReplacement {
    value: String,
}

#[derive(Deserialize)]
struct WireRule {
    id: String,
}

/// Parse a `/v2/check` body for `text` into char-offset matches.
pub fn parse_check_response(text: &str, body: &str) -> Result<Vec<GrammarMatch>, CollaboratorError> {
    let parsed: CheckResponse =
        serde_json::from_str(body).map_err(|e| CollaboratorError::Protocol {
            engine: ENGINE.into(),
            detail: e.to_string(),
        })?;

    Ok(parsed
        .matches
        .into_iter()
        .map(|m| {
            let start = utf16_to_char_offset(text, m.offset);
            let end = utf16_to_char_offset(text, m.offset.saturating_add(m.length));
            GrammarMatch {
                message: m.message,
                offset: start,
                length: end.saturating_sub(start),
                replacements: m.replacements.into_iter().map(|r| r.value).collect(),
                rule_id: m.rule.map(|r| r.id),
            }
        })
        .collect())
}

/// Char index corresponding to a UTF-16 code-unit offset (clamped).
fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (i, c) in text.chars().enumerate() {
        if units >= utf16_offset {
            return i;
        }
        units += c.len_utf16();
    }
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "software": {"name": "LanguageTool", "version": "6.4"},
        "language": {"name": "English (US)", "code": "en-US"},
        "matches": [
            {
                "message": "Possible Grammar error: did you mean \"They're\"?",
                "shortMessage": "",
                "offset": 0,
                "length": 5,
                "replacements": [{"value": "They're"}, {"value": "There"}],
                "context": {"text": "Their going to the store.", "offset": 0, "length": 5},
                "rule": {"id": "THEIR_IS", "description": "their/they're"}
            },
            {
                "message": "Possible Spelling mistake found.",
                "offset": 15,
                "length": 3,
                "replacements": [],
                "rule": {"id": "MORFOLOGIK_RULE_EN_US"}
            }
        ]
    }"#;

    #[test]
    fn parses_matches() {
        let matches = parse_check_response("Their going to teh store.", BODY).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].offset, 0);
        assert_eq!(matches[0].length, 5);
        assert_eq!(matches[0].replacements, vec!["They're", "There"]);
        assert_eq!(matches[0].rule_id.as_deref(), Some("THEIR_IS"));
        assert!(matches[1].replacements.is_empty());
    }

    #[test]
    fn missing_matches_is_empty() {
        assert!(parse_check_response("ok", "{}").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_protocol_error() {
        let err = parse_check_response("x", "<html>").unwrap_err();
        assert!(matches!(err, CollaboratorError::Protocol { .. }));
    }

    #[test]
    fn utf16_offsets_become_char_offsets() {
        // "😀" is two UTF-16 units but one char.
        let text = "😀 teh cat";
        assert_eq!(utf16_to_char_offset(text, 3), 2);
        assert_eq!(utf16_to_char_offset(text, 100), text.chars().count());
    }

    #[test]
    fn out_of_range_match_is_clamped_to_the_text() {
        let body = format!(
            r#"{{"matches": [{{"message": "m", "offset": 3, "length": {}, "replacements": []}}]}}"#,
            usize::MAX
        );
        let matches = parse_check_response("abcdef", &body).unwrap();
        assert_eq!(matches[0].offset, 3);
        assert_eq!(matches[0].length, 3);
    }

    #[test]
    fn check_url_is_normalised() {
        let client = LanguageToolClient::new("http://localhost:8081/", "en-US", 5).unwrap();
        assert_eq!(client.check_url, "http://localhost:8081/v2/check");
        assert_eq!(client.language(), "en-US");
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let client = LanguageToolClient::new("http://127.0.0.1:9", "en-US", 2).unwrap();
        let err = client.check("Some text.").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Unavailable { .. }), "got {err:?}");
    }
}
