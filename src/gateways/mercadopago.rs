use crate::gateways::{
    CheckoutPreference, GatewayError, GatewayPayment, GatewayPaymentStatus, PaymentGateway,
    PreferenceRequest,
};
use reqwest::RequestBuilder;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};

const GATEWAY: &str = "mercadopago";

pub struct MercadoPagoGateway {
    pub base_url: String,
    pub access_token: String,
    pub sandbox: bool,
    pub currency_id: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl MercadoPagoGateway {
    pub fn preference_body(&self, request: &PreferenceRequest) -> Value {
        let items: Vec<Value> = request
            .items
            .iter()
            .map(|item| {
                json!({
                    "id": item.product_id,
                    "title": item.title,
                    "quantity": item.quantity,
                    "unit_price": item.unit_price.to_f64().unwrap_or_default(),
                    "currency_id": self.currency_id,
                })
            })
            .collect();

        let mut body = json!({
            "items": items,
            "payer": {
                "email": request.payer.email,
                "name": request.payer.name,
                "surname": request.payer.surname,
            },
            "back_urls": {
                "success": request.back_urls.success,
                "failure": request.back_urls.failure,
                "pending": request.back_urls.pending,
            },
            "binary_mode": request.binary_mode,
            "notification_url": request.notification_url,
            "external_reference": request.external_reference,
        });

        if let Some(auto_return) = request.auto_return {
            body["auto_return"] = json!(auto_return);
        }

        body
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, GatewayError> {
        let resp = request
            .bearer_auth(&self.access_token)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        match resp {
            Ok(r) if r.status().is_success() => r
                .json::<Value>()
                .await
                .map_err(|e| error(None, format!("unreadable response body: {e}"), None)),
            Ok(r) => {
                let status = r.status();
                let body = r.text().await.unwrap_or_default();
                let payload = serde_json::from_str::<Value>(&body)
                    .unwrap_or_else(|_| Value::String(body.chars().take(500).collect()));
                Err(error(
                    Some(status.as_u16()),
                    format!("HTTP_{}", status.as_u16()),
                    Some(payload),
                ))
            }
            Err(e) if e.is_timeout() => Err(error(None, "gateway timeout".to_string(), None)),
            Err(e) => Err(error(None, format!("network error: {e}"), None)),
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MercadoPagoGateway {
    fn name(&self) -> &'static str {
        GATEWAY
    }

    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<CheckoutPreference, GatewayError> {
        let url = format!("{}/checkout/preferences", self.base_url);
        let v = self
            .send(self.client.post(url).json(&self.preference_body(request)))
            .await?;

        let link_field = if self.sandbox {
            "sandbox_init_point"
        } else {
            "init_point"
        };

        let id = v.get("id").and_then(value_to_string);
        let checkout_url = v
            .get(link_field)
            .and_then(|u| u.as_str())
            .map(str::to_string);

        match (id, checkout_url) {
            (Some(id), Some(checkout_url)) => Ok(CheckoutPreference { id, checkout_url }),
            _ => Err(error(
                None,
                format!("preference response is missing id or {link_field}"),
                Some(v),
            )),
        }
    }

    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let url = format!("{}/v1/payments/{}", self.base_url, payment_id);
        let v = self.send(self.client.get(url)).await?;
        Ok(parse_payment(&v, payment_id))
    }
}

/// Payment ids come back as JSON numbers; the requested id is the fallback.
pub fn parse_payment(v: &Value, requested_id: &str) -> GatewayPayment {
    GatewayPayment {
        id: v
            .get("id")
            .and_then(value_to_string)
            .unwrap_or_else(|| requested_id.to_string()),
        status: v
            .get("status")
            .cloned()
            .and_then(|s| serde_json::from_value(s).ok())
            .unwrap_or(GatewayPaymentStatus::Unknown),
        external_reference: v.get("external_reference").and_then(value_to_string),
    }
}

fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn error(status: Option<u16>, message: String, payload: Option<Value>) -> GatewayError {
    GatewayError {
        gateway: GATEWAY,
        status,
        message,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bill::{AutoReturn, BackUrls, BillItem, Payer};
    use rust_decimal::Decimal;

    fn gateway() -> MercadoPagoGateway {
        MercadoPagoGateway {
            base_url: "http://localhost".to_string(),
            access_token: "TEST".to_string(),
            sandbox: false,
            currency_id: "ARS".to_string(),
            timeout_ms: 100,
            client: reqwest::Client::new(),
        }
    }

    #[test]
    fn preference_body_carries_reference_and_urls() {
        let request = PreferenceRequest {
            external_reference: "bill-1".to_string(),
            items: vec![BillItem {
                product_id: uuid::Uuid::nil(),
                title: "Runner".to_string(),
                quantity: 2,
                unit_price: Decimal::new(10050, 2),
                size: None,
            }],
            payer: Payer {
                email: "a@b.com".to_string(),
                name: None,
                surname: None,
            },
            back_urls: BackUrls {
                success: "https://shop/ok".to_string(),
                failure: "https://shop/ko".to_string(),
                pending: "https://shop/wait".to_string(),
            },
            auto_return: Some(AutoReturn::Approved),
            binary_mode: true,
            notification_url: "https://api/bills/payment/notification".to_string(),
        };

        let body = gateway().preference_body(&request);
        assert_eq!(body["external_reference"], "bill-1");
        assert_eq!(body["auto_return"], "approved");
        assert_eq!(body["items"][0]["unit_price"], 100.5);
        assert_eq!(body["items"][0]["currency_id"], "ARS");
        assert_eq!(body["back_urls"]["pending"], "https://shop/wait");
    }

    #[test]
    fn payment_with_numeric_id_parses() {
        let v = json!({"id": 42, "status": "in_process", "external_reference": "abc"});
        let p = parse_payment(&v, "42");
        assert_eq!(p.id, "42");
        assert_eq!(p.status, GatewayPaymentStatus::InProcess);
        assert_eq!(p.external_reference.as_deref(), Some("abc"));
    }
}
