use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn translation_labels_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Models often bold the labels ("**Spanish:**"), so tolerate markdown emphasis around them.
        Regex::new(r"(?i)(?:\*\*|__)?\b(spanish|notes)\b(?:\*\*|__)?\s*:(?:\*\*|__)?")
            .expect("valid translation label regex")
    })
}

fn correction_labels_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:\*\*|__)?\b(corrected|explanation|english)\b(?:\*\*|__)?\s*:(?:\*\*|__)?",
        )
        .expect("valid correction label regex")
    })
}

/// Split `text` into labelled sections. Each value runs until the next label.
///
/// The first occurrence of a label wins; labels are lowercased.
fn extract_fields(text: &str, re: &Regex) -> HashMap<String, String> {
    let marks: Vec<(String, usize, usize)> = re
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let label = c.get(1)?.as_str().to_lowercase();
            Some((label, whole.start(), whole.end()))
        })
        .collect();

    let mut out = HashMap::new();
    for (i, (label, _, content_start)) in marks.iter().enumerate() {
        let content_end = marks.get(i + 1).map(|(_, s, _)| *s).unwrap_or(text.len());
        let value = text[*content_start..content_end].trim();
        if !value.is_empty() {
            out.entry(label.clone()).or_insert_with(|| value.to_string());
        }
    }
    out
}

/// Best-effort view of a `Spanish: … / Notes: …` reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationReply {
    pub spanish: Option<String>,
    pub notes: Option<String>,
}

impl TranslationReply {
    pub fn parse(text: &str) -> Self {
        let mut fields = extract_fields(text, translation_labels_re());
        Self {
            spanish: fields.remove("spanish"),
            notes: fields.remove("notes"),
        }
    }
}

/// Best-effort view of a `Corrected: … / Explanation: … / English: …` reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CorrectionReply {
    pub corrected: Option<String>,
    pub explanation: Option<String>,
    pub english: Option<String>,
}

impl CorrectionReply {
    pub fn parse(text: &str) -> Self {
        let mut fields = extract_fields(text, correction_labels_re());
        Self {
            corrected: fields.remove("corrected"),
            explanation: fields.remove("explanation"),
            english: fields.remove("english"),
        }
    }

    pub fn is_confirmed_correct(&self) -> bool {
        self.corrected
            .as_deref()
            .map(|c| c.to_lowercase().contains("correcto"))
            .unwrap_or(false)
    }
}

/// The line of a conversational reply worth reading aloud: the first non-empty one.
pub fn conversation_speech_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}
