//! HTML views rendered with askama

use askama_axum::Template;
use screening_core::{Screening, ValidationRecord};
use serde_json::Value;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate;

#[derive(Template)]
#[template(path = "bulk.html")]
pub struct BulkTemplate;

#[derive(Template)]
#[template(path = "result.html")]
pub struct ResultTemplate {
    pub email: String,
    pub suspicious: bool,
    pub fields: Vec<(String, String)>,
}

impl From<Screening> for ResultTemplate {
    fn from(screening: Screening) -> Self {
        Self {
            fields: display_fields(&screening.record),
            email: screening.email,
            suspicious: screening.suspicious,
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub message: String,
    pub reference: String,
    pub timestamp: String,
}

/// Record fields as display strings, in response order
fn display_fields(record: &ValidationRecord) -> Vec<(String, String)> {
    record
        .fields()
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_result_view_fields() {
        let record = ValidationRecord::from_value(json!({
            "valid": true,
            "fraud_score": 12,
            "first_name": "Ann",
            "leaked": null
        }))
        .unwrap();
        let view = ResultTemplate::from(Screening {
            email: "ann@example.com".to_string(),
            record,
            suspicious: false,
        });

        assert_eq!(
            view.fields,
            vec![
                ("valid".to_string(), "true".to_string()),
                ("fraud_score".to_string(), "12".to_string()),
                ("first_name".to_string(), "Ann".to_string()),
                ("leaked".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_result_view_escapes_html() {
        let record = ValidationRecord::from_value(json!({"first_name": "<script>"})).unwrap();
        let html = ResultTemplate::from(Screening {
            email: "x@example.com".to_string(),
            record,
            suspicious: true,
        })
        .render()
        .unwrap();

        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("looks suspicious"));
    }
}
