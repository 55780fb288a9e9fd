use crate::gateways::{
    CheckoutPreference, GatewayError, GatewayPayment, PaymentGateway, PreferenceRequest,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted gateway for local runs and tests. `ALWAYS_FAILURE` makes every
/// preference request fail; payments must be registered with `set_payment`.
pub struct MockGateway {
    pub checkout_base_url: String,
    pub behavior: String,
    payments: Mutex<HashMap<String, GatewayPayment>>,
    preferences: Mutex<Vec<PreferenceRequest>>,
    payment_lookups: AtomicUsize,
}

impl MockGateway {
    pub fn new(checkout_base_url: impl Into<String>, behavior: impl Into<String>) -> Self {
        Self {
            checkout_base_url: checkout_base_url.into(),
            behavior: behavior.into(),
            payments: Mutex::new(HashMap::new()),
            preferences: Mutex::new(Vec::new()),
            payment_lookups: AtomicUsize::new(0),
        }
    }

    pub fn set_payment(&self, payment: GatewayPayment) {
        if let Ok(mut payments) = self.payments.lock() {
            payments.insert(payment.id.clone(), payment);
        }
    }

    pub fn last_preference(&self) -> Option<PreferenceRequest> {
        self.preferences.lock().ok().and_then(|p| p.last().cloned())
    }

    pub fn payment_lookups(&self) -> usize {
        self.payment_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<CheckoutPreference, GatewayError> {
        if self.behavior == "ALWAYS_FAILURE" {
            return Err(GatewayError {
                gateway: "mock",
                status: Some(400),
                message: "HTTP_400".to_string(),
                payload: Some(serde_json::json!({"message": "mock preference declined"})),
            });
        }

        if let Ok(mut preferences) = self.preferences.lock() {
            preferences.push(request.clone());
        }

        let id = format!("mock_pref_{}", uuid::Uuid::new_v4());
        Ok(CheckoutPreference {
            checkout_url: format!("{}?pref_id={}", self.checkout_base_url, id),
            id,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        self.payment_lookups.fetch_add(1, Ordering::SeqCst);
        self.payments
            .lock()
            .ok()
            .and_then(|p| p.get(payment_id).cloned())
            .ok_or_else(|| GatewayError {
                gateway: "mock",
                status: Some(404),
                message: "HTTP_404".to_string(),
                payload: Some(serde_json::json!({"message": "payment not found"})),
            })
    }
}
