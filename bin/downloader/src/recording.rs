//! Reading call statistics and naming recording files.

use crate::error::DownloadError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use tracing::warn;

const CALLSTART_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const UNSAFE_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// One call from a statistics response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub call_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub callstart: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sip: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub destination: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub seconds: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub disposition: String,
    #[serde(default)]
    is_recorded: JsonValue,
}

impl CallRecord {
    /// Returns true when the provider holds a recording for this call.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        match &self.is_recorded {
            JsonValue::Bool(flag) => *flag,
            JsonValue::String(flag) => flag == "true",
            _ => false,
        }
    }
}

/// Accepts strings, numbers and booleans as text; null becomes empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => String::new(),
        JsonValue::String(text) => text,
        other => other.to_string(),
    })
}

/// Fails unless the response has `status == "success"`.
///
/// # Errors
///
/// Returns [`DownloadError::Rejected`] with the provider message.
pub fn ensure_success(response: &JsonValue) -> Result<(), DownloadError> {
    if response["status"].as_str() == Some("success") {
        return Ok(());
    }
    Err(DownloadError::Rejected {
        message: response["message"]
            .as_str()
            .unwrap_or("Unknown error")
            .to_string(),
    })
}

/// Returns the recorded calls from a statistics response.
///
/// Entries that are not objects are skipped.
///
/// # Errors
///
/// Returns [`DownloadError::Rejected`] if the response is not a success.
pub fn recorded_calls(response: &JsonValue) -> Result<Vec<CallRecord>, DownloadError> {
    ensure_success(response)?;

    let Some(stats) = response["stats"].as_array() else {
        return Ok(Vec::new());
    };

    Ok(stats
        .iter()
        .filter_map(|entry| match CallRecord::deserialize(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skipping malformed statistics entry");
                None
            }
        })
        .filter(CallRecord::is_recorded)
        .collect())
}

/// Returns the download link from a recording-link response.
#[must_use]
pub fn recording_link(response: &JsonValue) -> Option<&str> {
    if response["status"].as_str() != Some("success") {
        return None;
    }
    response["link"].as_str().filter(|link| !link.is_empty())
}

/// Filename layout with `{placeholder}` substitution.
///
/// Placeholders: `{call_id}`, `{date}`, `{time}`, `{sip}`,
/// `{destination}`, `{duration}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate(String);

impl FilenameTemplate {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Renders the filename for a call, with unsafe characters replaced.
    #[must_use]
    pub fn render(&self, record: &CallRecord) -> String {
        let started = NaiveDateTime::parse_from_str(record.callstart.trim(), CALLSTART_FORMAT).ok();
        let date = started.map_or_else(
            || "unknown_date".to_string(),
            |at| at.format("%Y%m%d").to_string(),
        );
        let time = started.map_or_else(
            || "unknown_time".to_string(),
            |at| at.format("%H%M%S").to_string(),
        );

        let rendered = self
            .0
            .replace("{call_id}", or_unknown(&record.call_id))
            .replace("{date}", &date)
            .replace("{time}", &time)
            .replace("{sip}", or_unknown(&record.sip))
            .replace("{destination}", or_unknown(&record.destination))
            .replace("{duration}", non_empty_or(&record.seconds, "0"));

        sanitize_filename(&rendered)
    }
}

fn or_unknown(value: &str) -> &str {
    non_empty_or(value, "unknown")
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// Replaces characters not allowed in filenames with `_`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FILENAME_TEMPLATE;
    use serde_json::json;

    fn record() -> CallRecord {
        CallRecord::deserialize(json!({
            "call_id": "1700000000.123",
            "callstart": "2024-01-15 09:05:07",
            "sip": "100",
            "destination": 79001234567_u64,
            "seconds": 42,
            "disposition": "answered",
            "is_recorded": "true"
        }))
        .expect("record")
    }

    #[test]
    fn numbers_are_read_as_text() {
        let record = record();
        assert_eq!(record.destination, "79001234567");
        assert_eq!(record.seconds, "42");
    }

    #[test]
    fn default_template_renders_call_details() {
        let name = FilenameTemplate::new(DEFAULT_FILENAME_TEMPLATE).render(&record());
        assert_eq!(name, "call_1700000000.123_20240115_090507_100_to_79001234567.wav");
    }

    #[test]
    fn unparsable_start_uses_unknown_markers() {
        let mut record = record();
        record.callstart = "yesterday".to_string();
        let name = FilenameTemplate::new("{date}-{time}").render(&record);
        assert_eq!(name, "unknown_date-unknown_time");
    }

    #[test]
    fn missing_fields_fall_back() {
        let record = CallRecord::default();
        let name = FilenameTemplate::new("{call_id}_{sip}_{destination}_{duration}").render(&record);
        assert_eq!(name, "unknown_unknown_unknown_0");
    }

    #[test]
    fn rendered_names_are_sanitized() {
        let mut record = record();
        record.sip = "a/b:c".to_string();
        let name = FilenameTemplate::new("{sip}.wav").render(&record);
        assert_eq!(name, "a_b_c.wav");
    }

    #[test]
    fn sanitize_replaces_every_unsafe_character() {
        assert_eq!(sanitize_filename(r#"<>:"/\|?*ok"#), "_________ok");
    }

    #[test]
    fn recorded_flag_accepts_string_and_bool() {
        let response = json!({
            "status": "success",
            "stats": [
                {"call_id": "1", "is_recorded": "true"},
                {"call_id": "2", "is_recorded": true},
                {"call_id": "3", "is_recorded": "false"},
                {"call_id": "4"},
                "not an object"
            ]
        });

        let ids: Vec<_> = recorded_calls(&response)
            .expect("calls")
            .into_iter()
            .map(|record| record.call_id)
            .collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn missing_stats_is_empty() {
        let calls = recorded_calls(&json!({"status": "success"})).expect("calls");
        assert!(calls.is_empty());
    }

    #[test]
    fn error_status_carries_provider_message() {
        let result = recorded_calls(&json!({"status": "error", "message": "wrong key"}));
        match result {
            Err(DownloadError::Rejected { message }) => assert_eq!(message, "wrong key"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn error_status_without_message() {
        match ensure_success(&json!({})) {
            Err(DownloadError::Rejected { message }) => assert_eq!(message, "Unknown error"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn link_requires_success_and_link() {
        assert_eq!(
            recording_link(&json!({"status": "success", "link": "https://x/rec.mp3"})),
            Some("https://x/rec.mp3")
        );
        assert_eq!(recording_link(&json!({"status": "success"})), None);
        assert_eq!(recording_link(&json!({"status": "success", "link": ""})), None);
        assert_eq!(
            recording_link(&json!({"status": "error", "link": "https://x"})),
            None
        );
    }
}
