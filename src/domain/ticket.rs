use serde::Serialize;
use serde_json::{Map, Value};

pub const CATEGORIES: [&str; 3] = ["Technical issues", "Hardware issues", "Data recovery"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Resolution estimate the prompt asks the model to pair with this priority.
    pub fn eta(&self) -> &'static str {
        match self {
            Priority::High => "Immediate",
            Priority::Medium => "24 hours",
            Priority::Low => "2-3 business days",
        }
    }
}

/// Which source wins for a row's `eta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EtaPolicy {
    /// Keep whatever the model produced.
    #[default]
    Model,
    /// Derive `eta` from a recognized `priority`.
    Priority,
}

impl EtaPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EtaPolicy::Model => "model",
            EtaPolicy::Priority => "priority",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "model" => Some(EtaPolicy::Model),
            "priority" => Some(EtaPolicy::Priority),
            _ => None,
        }
    }
}

/// Parsed model output. Untrusted: keys and value types are whatever the model sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationRecord(Map<String, Value>);

impl ClassificationRecord {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn text_field(&self, key: &str) -> String {
        self.get(key).map(value_to_text).unwrap_or_default()
    }

    pub fn tags(&self) -> Vec<String> {
        match self.get("tags") {
            Some(Value::Array(items)) => items.iter().map(value_to_text).collect(),
            Some(Value::String(tag)) => vec![tag.clone()],
            _ => Vec::new(),
        }
    }
}

impl From<Map<String, Value>> for ClassificationRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Classified,
    Malformed,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub ticket: String,
    pub category: String,
    pub tags: Vec<String>,
    pub priority: String,
    pub eta: String,
    pub response: String,
    pub status: RowStatus,
}

impl ResultRow {
    pub fn from_record(
        ticket: &str,
        record: &ClassificationRecord,
        status: RowStatus,
        eta_policy: EtaPolicy,
    ) -> Self {
        let priority = record.text_field("priority");
        let eta = match (eta_policy, Priority::from_str(&priority)) {
            (EtaPolicy::Priority, Some(known)) => known.eta().to_string(),
            _ => record.text_field("eta"),
        };

        Self {
            ticket: ticket.to_string(),
            category: record.text_field("category"),
            tags: record.tags(),
            priority,
            eta,
            response: record.text_field("response"),
            status,
        }
    }

    pub fn unavailable(ticket: &str) -> Self {
        Self::from_record(
            ticket,
            &ClassificationRecord::empty(),
            RowStatus::Unavailable,
            EtaPolicy::Model,
        )
    }

    pub fn is_known_category(&self) -> bool {
        CATEGORIES.contains(&self.category.as_str())
    }
}

pub type ResultSet = Vec<ResultRow>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> ClassificationRecord {
        match value {
            Value::Object(map) => ClassificationRecord::from(map),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn empty_record_yields_default_fields() {
        let row = ResultRow::from_record(
            "ticket",
            &ClassificationRecord::empty(),
            RowStatus::Malformed,
            EtaPolicy::Model,
        );
        assert_eq!(row.category, "");
        assert!(row.tags.is_empty());
        assert_eq!(row.priority, "");
        assert_eq!(row.eta, "");
        assert_eq!(row.response, "");
        assert_eq!(row.status, RowStatus::Malformed);
    }

    #[test]
    fn mistyped_values_pass_through_as_text() {
        let rec = record(json!({
            "category": 7,
            "tags": "single",
            "priority": null,
            "response": {"nested": true}
        }));
        let row = ResultRow::from_record("t", &rec, RowStatus::Classified, EtaPolicy::Model);
        assert_eq!(row.category, "7");
        assert_eq!(row.tags, vec!["single".to_string()]);
        assert_eq!(row.priority, "");
        assert_eq!(row.response, "{\"nested\":true}");
        assert!(!row.is_known_category());
    }

    #[test]
    fn tags_array_keeps_order_and_stringifies_non_strings() {
        let rec = record(json!({"tags": ["laptop", 3, "deadline"]}));
        assert_eq!(rec.tags(), vec!["laptop", "3", "deadline"]);

        let rec = record(json!({"tags": {"a": 1}}));
        assert!(rec.tags().is_empty());
    }

    #[test]
    fn model_eta_policy_trusts_model() {
        let rec = record(json!({"priority": "High", "eta": "next week"}));
        let row = ResultRow::from_record("t", &rec, RowStatus::Classified, EtaPolicy::Model);
        assert_eq!(row.eta, "next week");
    }

    #[test]
    fn priority_eta_policy_overrides_known_priorities_only() {
        let rec = record(json!({"priority": "medium", "eta": "next week"}));
        let row = ResultRow::from_record("t", &rec, RowStatus::Classified, EtaPolicy::Priority);
        assert_eq!(row.eta, "24 hours");
        assert_eq!(row.priority, "medium");

        let rec = record(json!({"priority": "Critical", "eta": "now"}));
        let row = ResultRow::from_record("t", &rec, RowStatus::Classified, EtaPolicy::Priority);
        assert_eq!(row.eta, "now");
    }

    #[test]
    fn parses_priority_and_policy() {
        assert_eq!(Priority::from_str(" LOW "), Some(Priority::Low));
        assert_eq!(Priority::from_str("urgent"), None);
        assert_eq!(Priority::High.eta(), "Immediate");
        assert_eq!(Priority::Low.eta(), "2-3 business days");
        assert_eq!(EtaPolicy::from_str("Priority"), Some(EtaPolicy::Priority));
        assert_eq!(EtaPolicy::from_str("other"), None);
    }

    #[test]
    fn serializes_row_with_status() {
        let row = ResultRow::unavailable("t");
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["status"], "unavailable");
        assert_eq!(value["tags"], json!([]));
    }
}
