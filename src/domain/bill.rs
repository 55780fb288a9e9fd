use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Pending,
    Approved,
    Rejected,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Approved => "approved",
            BillStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(BillStatus::Pending),
            "approved" => Some(BillStatus::Approved),
            "rejected" => Some(BillStatus::Rejected),
            _ => None,
        }
    }

    /// Approved and rejected bills never change status again.
    pub fn is_final(&self) -> bool {
        !matches!(self, BillStatus::Pending)
    }

    /// `pending` may move anywhere; a final status only "moves" to itself.
    pub fn can_transition_to(&self, next: BillStatus) -> bool {
        *self == next || !self.is_final()
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub product_id: Uuid,
    pub title: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl BillItem {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payer {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackUrls {
    #[serde(default)]
    pub success: String,
    #[serde(default)]
    pub failure: String,
    #[serde(default)]
    pub pending: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoReturn {
    Approved,
    All,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateBillRequest {
    pub items: Vec<BillItem>,
    pub payer: Payer,
    #[serde(default)]
    pub back_urls: BackUrls,
    #[serde(default)]
    pub auto_return: Option<AutoReturn>,
    #[serde(default)]
    pub binary_mode: bool,
    #[serde(default)]
    pub notification_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub items: Vec<BillItem>,
    pub payer: Payer,
    pub payment_id: Option<String>,
    pub preference_id: Option<String>,
    pub status: BillStatus,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    pub fn new_pending(items: Vec<BillItem>, payer: Payer) -> Self {
        Self {
            id: Uuid::new_v4(),
            items,
            payer,
            payment_id: None,
            preference_id: None,
            status: BillStatus::Pending,
            disabled: false,
            created_at: Utc::now(),
        }
    }

    pub fn total(&self) -> Option<Decimal> {
        items_total(&self.items)
    }
}

/// Sum of all line subtotals, `None` on overflow.
pub fn items_total(items: &[BillItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.subtotal()?))
}

/// Raw `/bills/search` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillSearchQuery {
    pub email: Option<String>,
    pub status: Option<String>,
    pub id_payment: Option<String>,
}

/// Every populated field must match (AND). `status=disabled` in the query
/// string selects on the `disabled` flag instead of the payment status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillFilter {
    pub email: Option<String>,
    pub status: Option<BillStatus>,
    pub disabled: Option<bool>,
    pub payment_id: Option<String>,
}

impl BillFilter {
    pub fn from_query(query: BillSearchQuery) -> Result<Self, String> {
        let mut filter = BillFilter {
            email: non_blank(query.email),
            payment_id: non_blank(query.id_payment),
            ..Default::default()
        };

        if let Some(status) = non_blank(query.status) {
            if status.eq_ignore_ascii_case("disabled") {
                filter.disabled = Some(true);
            } else {
                filter.status = Some(
                    BillStatus::parse(&status)
                        .ok_or_else(|| format!("unknown bill status '{status}'"))?,
                );
            }
        }

        Ok(filter)
    }

    pub fn matches(&self, bill: &Bill) -> bool {
        if let Some(email) = &self.email {
            if !email.eq_ignore_ascii_case(&bill.payer.email) {
                return false;
            }
        }

        if let Some(status) = self.status {
            if status != bill.status {
                return false;
            }
        }

        if let Some(disabled) = self.disabled {
            if disabled != bill.disabled {
                return false;
            }
        }

        if let Some(payment_id) = &self.payment_id {
            if bill.payment_id.as_deref() != Some(payment_id.as_str()) {
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SetDisabledRequest {
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedBill {
    pub bill_id: Uuid,
    pub checkout_url: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_statuses_only_accept_themselves() {
        assert!(BillStatus::Pending.can_transition_to(BillStatus::Approved));
        assert!(BillStatus::Pending.can_transition_to(BillStatus::Rejected));
        assert!(BillStatus::Approved.can_transition_to(BillStatus::Approved));
        assert!(!BillStatus::Approved.can_transition_to(BillStatus::Rejected));
        assert!(!BillStatus::Rejected.can_transition_to(BillStatus::Pending));
    }

    fn item(unit_price: Decimal, quantity: i32) -> BillItem {
        BillItem {
            product_id: Uuid::nil(),
            title: "Runner".to_string(),
            quantity,
            unit_price,
            size: None,
        }
    }

    #[test]
    fn totals_report_overflow_instead_of_panicking() {
        assert_eq!(item(Decimal::MAX, 2).subtotal(), None);
        assert_eq!(items_total(&[item(Decimal::MAX, 1), item(Decimal::MAX, 1)]), None);
        assert_eq!(
            items_total(&[item(Decimal::new(1050, 2), 2), item(Decimal::ONE, 3)]),
            Some(Decimal::new(2400, 2))
        );
    }

    #[test]
    fn disabled_status_maps_to_flag() {
        let filter = BillFilter::from_query(BillSearchQuery {
            status: Some("Disabled".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.disabled, Some(true));
        assert_eq!(filter.status, None);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let out = BillFilter::from_query(BillSearchQuery {
            status: Some("paid".to_string()),
            ..Default::default()
        });
        assert!(out.is_err());
    }
}
