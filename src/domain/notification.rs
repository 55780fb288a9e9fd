use std::collections::HashMap;

pub const PAYMENT_TOPIC: &str = "payment";

/// What the gateway told us in one webhook delivery, before any lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentNotification {
    pub topic: Option<String>,
    pub payment_id: Option<String>,
}

impl PaymentNotification {
    pub fn is_payment(&self) -> bool {
        self.topic.as_deref() == Some(PAYMENT_TOPIC)
    }
}

/// Reads both delivery shapes the gateway uses. Query parameters win over
/// the body; an unreadable body is treated as absent.
pub fn parse_notification(query: &HashMap<String, String>, body: &[u8]) -> PaymentNotification {
    let body: Option<serde_json::Value> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice(body).ok()
    };

    let topic = query_value(query, &["topic", "type"]).or_else(|| {
        body.as_ref().and_then(|b| {
            json_str(b.get("topic"))
                .or_else(|| json_str(b.get("type")))
        })
    });

    let payment_id = query_value(query, &["id", "data.id"]).or_else(|| {
        body.as_ref().and_then(|b| {
            json_str(b.get("data").and_then(|d| d.get("id")))
                .or_else(|| json_str(b.get("id")))
                .or_else(|| {
                    json_str(b.get("resource"))
                        .and_then(|r| r.rsplit('/').next().map(str::to_string))
                        .filter(|s| !s.is_empty())
                })
        })
    });

    PaymentNotification { topic, payment_id }
}

/// Gateway payment ids are opaque tokens; anything else is not looked up.
pub fn is_valid_payment_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn query_value(query: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| query.get(*k))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn json_str(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reads_query_shape() {
        let n = parse_notification(&query(&[("topic", "payment"), ("id", "123")]), b"");
        assert!(n.is_payment());
        assert_eq!(n.payment_id.as_deref(), Some("123"));
    }

    #[test]
    fn reads_webhook_body_with_numeric_id() {
        let body = br#"{"type":"payment","data":{"id":987654}}"#;
        let n = parse_notification(&HashMap::new(), body);
        assert!(n.is_payment());
        assert_eq!(n.payment_id.as_deref(), Some("987654"));
    }

    #[test]
    fn reads_resource_url() {
        let body = br#"{"topic":"payment","resource":"https://api.mercadopago.com/v1/payments/555"}"#;
        let n = parse_notification(&HashMap::new(), body);
        assert_eq!(n.payment_id.as_deref(), Some("555"));
    }

    #[test]
    fn query_wins_over_body() {
        let body = br#"{"type":"merchant_order","data":{"id":"1"}}"#;
        let n = parse_notification(&query(&[("topic", "payment"), ("id", "2")]), body);
        assert_eq!(n.topic.as_deref(), Some("payment"));
        assert_eq!(n.payment_id.as_deref(), Some("2"));
    }

    #[test]
    fn garbage_body_yields_nothing() {
        let n = parse_notification(&HashMap::new(), b"not json");
        assert_eq!(n, PaymentNotification::default());
    }

    #[test]
    fn payment_id_charset() {
        assert!(is_valid_payment_id("PMT1"));
        assert!(is_valid_payment_id("12345678"));
        assert!(!is_valid_payment_id("../admin"));
        assert!(!is_valid_payment_id(""));
    }
}
