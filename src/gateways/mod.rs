use crate::domain::bill::{AutoReturn, BackUrls, BillItem, BillStatus, Payer};
use serde::{Deserialize, Serialize};

pub mod mercadopago;
pub mod mock;

/// Everything the gateway needs to build a hosted checkout for one bill.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
    pub external_reference: String,
    pub items: Vec<BillItem>,
    pub payer: Payer,
    pub back_urls: BackUrls,
    pub auto_return: Option<AutoReturn>,
    pub binary_mode: bool,
    pub notification_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutPreference {
    pub id: String,
    pub checkout_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    Pending,
    Approved,
    Authorized,
    InProcess,
    InMediation,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    #[serde(other)]
    Unknown,
}

impl GatewayPaymentStatus {
    /// `None` means the gateway status carries no bill transition.
    pub fn bill_status(&self) -> Option<BillStatus> {
        match self {
            GatewayPaymentStatus::Approved => Some(BillStatus::Approved),
            GatewayPaymentStatus::Rejected | GatewayPaymentStatus::Cancelled => {
                Some(BillStatus::Rejected)
            }
            GatewayPaymentStatus::Pending
            | GatewayPaymentStatus::InProcess
            | GatewayPaymentStatus::Authorized
            | GatewayPaymentStatus::InMediation => Some(BillStatus::Pending),
            GatewayPaymentStatus::Refunded
            | GatewayPaymentStatus::ChargedBack
            | GatewayPaymentStatus::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    pub status: GatewayPaymentStatus,
    pub external_reference: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{gateway} request failed: {message}")]
pub struct GatewayError {
    pub gateway: &'static str,
    pub status: Option<u16>,
    pub message: String,
    pub payload: Option<serde_json::Value>,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<CheckoutPreference, GatewayError>;

    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_statuses_map_onto_bill_statuses() {
        assert_eq!(
            GatewayPaymentStatus::InProcess.bill_status(),
            Some(BillStatus::Pending)
        );
        assert_eq!(
            GatewayPaymentStatus::Cancelled.bill_status(),
            Some(BillStatus::Rejected)
        );
        assert_eq!(GatewayPaymentStatus::Refunded.bill_status(), None);
    }

    #[test]
    fn unknown_gateway_status_deserializes() {
        let s: GatewayPaymentStatus = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(s, GatewayPaymentStatus::Unknown);
    }
}
