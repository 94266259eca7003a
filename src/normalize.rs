//! Response normalization: the repair + parse + validate pipeline turning raw
//! generation-service text into typed domain records.
//!
//! The service is free-form: responses arrive wrapped in markdown fences, with
//! unescaped control characters inside string literals, or with fields missing
//! outright. All defensive handling lives here; everything downstream works
//! with validated records only. The pipeline is pure and idempotent — the same
//! raw text always yields the same result.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::{ChoiceKey, Flashcard, GeneratedQuestion};
use crate::error::NormalizationError;

/// Remove one fenced-code-block wrapper (a leading and trailing delimiter
/// line) if both are present. Anything else passes through untouched.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") || !trimmed.ends_with("```") || trimmed.len() < 6 {
        return trimmed;
    }
    let without_close = trimmed[..trimmed.len() - 3].trim_end();
    match without_close.find('\n') {
        // Drop the opening delimiter line (``` or ```json).
        Some(newline) => without_close[newline + 1..].trim(),
        None => trimmed,
    }
}

/// Escape raw newline, carriage-return and tab characters unless the
/// character immediately preceding is a backslash. This is a best-effort
/// lexical repair for control characters the model left unescaped inside
/// string literals, not a JSON grammar fix; the caller keeps the pre-repair
/// text as a fallback because the replacement is applied position-blind and
/// can corrupt structural whitespace.
fn repair_control_chars(text: &str) -> String {
    let mut repaired = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        match c {
            '\n' if prev != Some('\\') => repaired.push_str("\\n"),
            '\r' if prev != Some('\\') => repaired.push_str("\\r"),
            '\t' if prev != Some('\\') => repaired.push_str("\\t"),
            other => repaired.push(other),
        }
        prev = Some(c);
    }
    repaired
}

/// Fence-strip, repair, and parse. On a parse failure of the repaired text the
/// pre-repair text is retried; if both fail, the FIRST parser's diagnostic is
/// reported.
fn parse_lenient(raw: &str) -> Result<Value, NormalizationError> {
    let stripped = strip_code_fence(raw);
    let repaired = repair_control_chars(stripped);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => Ok(value),
        Err(first) => {
            debug!(error = %first, "repaired text did not parse, retrying pre-repair text");
            match serde_json::from_str::<Value>(stripped) {
                Ok(value) => Ok(value),
                Err(second) => {
                    warn!(first = %first, second = %second, "response is not parseable JSON");
                    Err(NormalizationError::MalformedResponse(first.to_string()))
                }
            }
        }
    }
}

fn into_array(value: Value) -> Result<Vec<Value>, NormalizationError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(NormalizationError::SchemaMismatch("dizi (liste bekleniyordu)".into())),
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, NormalizationError> {
    value
        .as_object()
        .ok_or_else(|| NormalizationError::SchemaMismatch("soru nesnesi".into()))
}

fn required_text(obj: &Map<String, Value>, field: &str) -> Result<String, NormalizationError> {
    match obj.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(NormalizationError::SchemaMismatch(field.to_string())),
    }
}

fn options_from(obj: &Map<String, Value>) -> Result<BTreeMap<ChoiceKey, String>, NormalizationError> {
    let raw = obj
        .get("secenekler")
        .and_then(Value::as_object)
        .ok_or_else(|| NormalizationError::SchemaMismatch("secenekler".into()))?;
    if raw.len() != 4 {
        return Err(NormalizationError::SchemaMismatch("secenekler".into()));
    }
    let mut options = BTreeMap::new();
    for key in ChoiceKey::ALL {
        let text = raw
            .get(key.as_str())
            .and_then(Value::as_str)
            .ok_or_else(|| NormalizationError::SchemaMismatch("secenekler".into()))?;
        options.insert(key, text.to_string());
    }
    Ok(options)
}

fn question_from(value: &Value, topic_label_required: bool) -> Result<GeneratedQuestion, NormalizationError> {
    let obj = as_object(value)?;
    let prompt_text = required_text(obj, "soru")?;
    let options = options_from(obj)?;
    let correct_key = obj
        .get("dogruCevap")
        .and_then(Value::as_str)
        .and_then(|s| s.trim().parse::<ChoiceKey>().ok())
        .ok_or_else(|| NormalizationError::SchemaMismatch("dogruCevap".into()))?;
    let explanation = required_text(obj, "aciklama")?;
    let topic_label = match obj.get("konuAdi").and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Some(s.to_string()),
        _ if topic_label_required => {
            return Err(NormalizationError::SchemaMismatch("konuAdi".into()));
        }
        _ => None,
    };
    Ok(GeneratedQuestion { prompt_text, options, correct_key, explanation, topic_label })
}

/// Normalize a question-list response. `topic_label_required` is set by the
/// calling context: mixed and exam quizzes need a per-question topic label for
/// the results breakdown, single-topic quizzes do not.
pub fn normalize_question_list(
    raw: &str,
    topic_label_required: bool,
) -> Result<Vec<GeneratedQuestion>, NormalizationError> {
    let items = into_array(parse_lenient(raw)?)?;
    items
        .iter()
        .map(|item| question_from(item, topic_label_required))
        .collect()
}

/// Normalize a flashcard-list response.
pub fn normalize_flashcards(raw: &str) -> Result<Vec<Flashcard>, NormalizationError> {
    let items = into_array(parse_lenient(raw)?)?;
    items
        .iter()
        .map(|item| {
            let obj = item
                .as_object()
                .ok_or_else(|| NormalizationError::SchemaMismatch("kart nesnesi".into()))?;
            Ok(Flashcard {
                front: required_text(obj, "front")?,
                back: required_text(obj, "back")?,
            })
        })
        .collect()
}

/// Explanation text needs no structural validation; pass through trimmed.
pub fn normalize_explanation(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_QUESTION: &str = r#"[{"soru":"2^3 kaçtır?","secenekler":{"A":"6","B":"8","C":"9","D":"12"},"dogruCevap":"B","aciklama":"2^3 = 2*2*2 = 8","konuAdi":"Üslü İfadeler"}]"#;

    #[test]
    fn strips_fence_with_language_tag() {
        assert_eq!(strip_code_fence("```json\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fence("  [1,2] "), "[1,2]");
        assert_eq!(strip_code_fence("```json\n[1,2]"), "```json\n[1,2]");
    }

    #[test]
    fn fenced_flashcards_normalize() {
        // Scenario: fenced payload with one card.
        let cards = normalize_flashcards("```json\n[{\"front\":\"X\",\"back\":\"Y\"}]\n```").unwrap();
        assert_eq!(cards, vec![Flashcard { front: "X".into(), back: "Y".into() }]);
    }

    #[test]
    fn repairs_bare_newline_inside_string() {
        let raw = "[{\"soru\":\"line1\nline2\",\"secenekler\":{\"A\":\"a\",\"B\":\"b\",\"C\":\"c\",\"D\":\"d\"},\"dogruCevap\":\"A\",\"aciklama\":\"e\",\"konuAdi\":\"t\"}]";
        let questions = normalize_question_list(raw, true).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].prompt_text, "line1\nline2");
        assert_eq!(questions[0].correct_key, ChoiceKey::A);
    }

    #[test]
    fn already_escaped_sequences_survive_repair() {
        let raw = r#"[{"front":"a\nb","back":"c\td"}]"#;
        let cards = normalize_flashcards(raw).unwrap();
        assert_eq!(cards[0].front, "a\nb");
        assert_eq!(cards[0].back, "c\td");
    }

    #[test]
    fn falls_back_to_pre_repair_text_when_repair_corrupts() {
        // Pretty-printed JSON: structural newlines get escaped by the repair
        // pass, which breaks the grammar; the pre-repair retry must save it.
        let raw = "[\n  {\"front\": \"X\",\n   \"back\": \"Y\"}\n]";
        let cards = normalize_flashcards(raw).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].front, "X");
    }

    #[test]
    fn unparseable_text_reports_first_diagnostic() {
        let err = normalize_flashcards("not json at all").unwrap_err();
        assert!(matches!(err, NormalizationError::MalformedResponse(_)));
    }

    #[test]
    fn non_array_payload_is_a_schema_mismatch() {
        let err = normalize_question_list(r#"{"soru":"tek nesne"}"#, false).unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn missing_correct_key_is_a_schema_mismatch() {
        let raw = r#"[{"soru":"s","secenekler":{"A":"a","B":"b","C":"c","D":"d"},"aciklama":"e","konuAdi":"t"}]"#;
        let err = normalize_question_list(raw, true).unwrap_err();
        match err {
            NormalizationError::SchemaMismatch(field) => assert_eq!(field, "dogruCevap"),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn correct_key_outside_choice_set_is_rejected() {
        let raw = r#"[{"soru":"s","secenekler":{"A":"a","B":"b","C":"c","D":"d"},"dogruCevap":"E","aciklama":"e"}]"#;
        assert!(normalize_question_list(raw, false).unwrap_err().is_schema_mismatch());
    }

    #[test]
    fn options_must_have_exactly_the_four_keys() {
        let missing = r#"[{"soru":"s","secenekler":{"A":"a","B":"b","C":"c"},"dogruCevap":"A","aciklama":"e"}]"#;
        assert!(normalize_question_list(missing, false).unwrap_err().is_schema_mismatch());

        let extra = r#"[{"soru":"s","secenekler":{"A":"a","B":"b","C":"c","D":"d","E":"e"},"dogruCevap":"A","aciklama":"e"}]"#;
        assert!(normalize_question_list(extra, false).unwrap_err().is_schema_mismatch());
    }

    #[test]
    fn topic_label_requirement_depends_on_context() {
        let raw = r#"[{"soru":"s","secenekler":{"A":"a","B":"b","C":"c","D":"d"},"dogruCevap":"A","aciklama":"e"}]"#;
        assert!(normalize_question_list(raw, true).unwrap_err().is_schema_mismatch());
        let questions = normalize_question_list(raw, false).unwrap();
        assert_eq!(questions[0].topic_label, None);
    }

    #[test]
    fn normalization_is_idempotent() {
        let first = normalize_question_list(VALID_QUESTION, true).unwrap();
        let second = normalize_question_list(VALID_QUESTION, true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn valid_question_retains_all_fields() {
        let questions = normalize_question_list(VALID_QUESTION, true).unwrap();
        let q = &questions[0];
        assert_eq!(q.options.len(), 4);
        assert_eq!(q.options[&ChoiceKey::B], "8");
        assert_eq!(q.topic_label.as_deref(), Some("Üslü İfadeler"));
    }

    #[test]
    fn explanation_passes_through_trimmed() {
        assert_eq!(normalize_explanation("  ## Başlık\nMetin $x^2$ \n"), "## Başlık\nMetin $x^2$");
    }
}
