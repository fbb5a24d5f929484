use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::ticket::ClassificationRecord;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Best-effort cleanup of a raw completion before it is parsed.
///
/// Drops markdown code fences and makes sure the text is wrapped in a single
/// pair of object braces. The result is not guaranteed to be valid JSON.
pub fn sanitize(raw: &str) -> String {
    let stripped = raw.replace(JSON_FENCE, "").replace(FENCE, "");
    let mut text = stripped.trim().to_string();

    if !text.starts_with('{') {
        text.insert(0, '{');
    }
    if !text.ends_with('}') {
        text.push('}');
    }
    text
}

pub fn try_parse(sanitized: &str) -> Result<ClassificationRecord, serde_json::Error> {
    serde_json::from_str::<Map<String, Value>>(sanitized).map(ClassificationRecord::from)
}

/// Parses sanitized model output, falling back to an empty record.
pub fn parse(sanitized: &str) -> ClassificationRecord {
    match try_parse(sanitized) {
        Ok(record) => record,
        Err(err) => {
            warn!(error = %err, text = sanitized, "invalid JSON response");
            ClassificationRecord::empty()
        }
    }
}
