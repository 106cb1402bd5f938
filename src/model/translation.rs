use std::fmt::Display;

use serde::Deserialize;
use serde_json::Value;

/// The translation progress of one language in a Crowdin project.
#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct TranslationLanguageEntry {
    /// The language identifier (e.g. `en`, `fr`).
    pub language_id: String,

    /// The language display name.
    pub language_name: String,

    /// The translation progress, in percent (0-100).
    pub translation_progress: u8,

    /// The approval progress, in percent (0-100).
    pub approval_progress: u8,
}

impl TranslationLanguageEntry {
    /// Creates a new `TranslationLanguageEntry` instance.
    pub fn new(
        language_id: &str,
        language_name: &str,
        translation_progress: u8,
        approval_progress: u8,
    ) -> Self {
        Self {
            language_id: language_id.to_string(),
            language_name: language_name.to_string(),
            translation_progress,
            approval_progress,
        }
    }

    /// Parses one entry of the Crowdin progress envelope
    /// (`{"data": {"language": {"id", "name"}, "translationProgress", "approvalProgress"}}`).
    pub fn from_progress_value(value: &Value) -> Option<Self> {
        let data = value.get("data")?;
        let language = data.get("language")?;

        Some(Self::new(
            language.get("id")?.as_str()?,
            language.get("name")?.as_str()?,
            data.get("translationProgress")?.as_u64()? as u8,
            data.get("approvalProgress")?.as_u64()? as u8,
        ))
    }
}

impl Display for TranslationLanguageEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): translated={}%, approved={}%",
            self.language_name, self.language_id, self.translation_progress, self.approval_progress
        )
    }
}

/// Sorts language entries by descending approval progress, then descending
/// translation progress, then ascending language name. The `en` entry, if
/// present, is then moved to the front regardless of its sort position.
pub fn sort_language_entries(entries: &mut Vec<TranslationLanguageEntry>) {
    entries.sort_by(|a, b| {
        b.approval_progress
            .cmp(&a.approval_progress)
            .then_with(|| b.translation_progress.cmp(&a.translation_progress))
            .then_with(|| a.language_name.cmp(&b.language_name))
    });

    if let Some(english_index) = entries
        .iter()
        .position(|entry| entry.language_id == "en")
    {
        let english = entries.remove(english_index);
        entries.insert(0, english);
    }
}
