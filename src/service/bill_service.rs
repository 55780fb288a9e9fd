use crate::domain::bill::{
    items_total, Bill, BillFilter, BillSearchQuery, BillStatus, CreateBillRequest, CreatedBill,
};
use crate::domain::notification::{is_valid_payment_id, PAYMENT_TOPIC};
use crate::error::ServiceError;
use crate::gateways::{GatewayPaymentStatus, PaymentGateway, PreferenceRequest};
use crate::repo::bills_repo::BillStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// What one notification delivery did. None of these are failures from the
/// gateway's point of view; every one of them is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    IgnoredTopic,
    UnmappedStatus(GatewayPaymentStatus),
    /// No bill could be tied to the payment.
    Mismatch,
    Unchanged {
        bill_id: Uuid,
        status: BillStatus,
    },
    Transitioned {
        bill_id: Uuid,
        from: BillStatus,
        to: BillStatus,
    },
    /// The state machine forbids the move, e.g. approved -> rejected.
    Refused {
        bill_id: Uuid,
        current: BillStatus,
        requested: BillStatus,
    },
}

#[derive(Clone)]
pub struct BillService {
    pub store: Arc<dyn BillStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub default_notification_url: String,
}

impl BillService {
    pub async fn list_all(&self) -> Result<Vec<Bill>, ServiceError> {
        Ok(self.store.list_all().await?)
    }

    /// Persists the bill as pending, then asks the gateway for a checkout.
    /// A gateway failure leaves the pending bill behind without a payment id.
    pub async fn create_bill(&self, req: CreateBillRequest) -> Result<CreatedBill, ServiceError> {
        validate_create(&req)?;

        let bill = Bill::new_pending(req.items, req.payer);
        self.store.insert(&bill).await?;
        tracing::info!(
            bill_id = %bill.id,
            total = %bill.total().unwrap_or_default(),
            "bill created"
        );

        let notification_url = req
            .notification_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.default_notification_url.clone());

        let preference_request = PreferenceRequest {
            external_reference: bill.id.to_string(),
            items: bill.items.clone(),
            payer: bill.payer.clone(),
            back_urls: req.back_urls,
            auto_return: req.auto_return,
            binary_mode: req.binary_mode,
            notification_url,
        };

        let preference = match self.gateway.create_preference(&preference_request).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(
                    bill_id = %bill.id,
                    gateway = self.gateway.name(),
                    error = %e,
                    "checkout preference failed"
                );
                return Err(e.into());
            }
        };

        self.store.attach_preference(bill.id, &preference.id).await?;
        tracing::info!(bill_id = %bill.id, preference_id = %preference.id, "checkout preference created");

        Ok(CreatedBill {
            bill_id: bill.id,
            checkout_url: preference.checkout_url,
        })
    }

    pub async fn handle_notification(
        &self,
        topic: &str,
        payment_id: &str,
    ) -> Result<NotificationOutcome, ServiceError> {
        if topic != PAYMENT_TOPIC {
            tracing::debug!(topic, "ignoring non-payment notification");
            return Ok(NotificationOutcome::IgnoredTopic);
        }

        if !is_valid_payment_id(payment_id) {
            tracing::warn!(payment_id, "notification carries an unusable payment id");
            return Ok(NotificationOutcome::Mismatch);
        }

        let payment = self.gateway.get_payment(payment_id).await?;
        let Some(target) = payment.status.bill_status() else {
            tracing::info!(payment_id, status = ?payment.status, "payment status carries no bill transition");
            return Ok(NotificationOutcome::UnmappedStatus(payment.status));
        };

        let bill = match self.store.find_by_payment_id(&payment.id).await? {
            Some(bill) => bill,
            None => {
                let by_reference = match payment
                    .external_reference
                    .as_deref()
                    .and_then(|r| Uuid::parse_str(r.trim()).ok())
                {
                    Some(bill_id) => self.store.find_by_id(bill_id).await?,
                    None => None,
                };
                match by_reference {
                    Some(bill) => bill,
                    None => {
                        tracing::warn!(
                            payment_id = %payment.id,
                            external_reference = ?payment.external_reference,
                            "no bill matches payment notification"
                        );
                        return Ok(NotificationOutcome::Mismatch);
                    }
                }
            }
        };

        if let Some(existing) = &bill.payment_id {
            if existing != &payment.id {
                tracing::warn!(
                    bill_id = %bill.id,
                    recorded_payment_id = %existing,
                    payment_id = %payment.id,
                    "bill already tied to another payment"
                );
                return Ok(NotificationOutcome::Mismatch);
            }
        }

        if bill.status == target {
            if bill.payment_id.is_none()
                && !self
                    .store
                    .apply_payment_status(bill.id, &payment.id, bill.status, target)
                    .await?
            {
                return self.lost_race(&bill, &payment.id, target).await;
            }
            return Ok(NotificationOutcome::Unchanged {
                bill_id: bill.id,
                status: bill.status,
            });
        }

        if !bill.status.can_transition_to(target) {
            tracing::warn!(
                bill_id = %bill.id,
                current = %bill.status,
                requested = %target,
                "refusing bill status transition"
            );
            return Ok(NotificationOutcome::Refused {
                bill_id: bill.id,
                current: bill.status,
                requested: target,
            });
        }

        let applied = self
            .store
            .apply_payment_status(bill.id, &payment.id, bill.status, target)
            .await?;

        if !applied {
            return self.lost_race(&bill, &payment.id, target).await;
        }

        tracing::info!(
            bill_id = %bill.id,
            payment_id = %payment.id,
            from = %bill.status,
            to = %target,
            "bill status updated"
        );
        Ok(NotificationOutcome::Transitioned {
            bill_id: bill.id,
            from: bill.status,
            to: target,
        })
    }

    /// A conditional update matched nothing: another delivery changed the
    /// bill in between. Report what that delivery left behind.
    async fn lost_race(
        &self,
        bill: &Bill,
        payment_id: &str,
        target: BillStatus,
    ) -> Result<NotificationOutcome, ServiceError> {
        let Some(current) = self.store.find_by_id(bill.id).await? else {
            return Ok(NotificationOutcome::Mismatch);
        };

        if current
            .payment_id
            .as_deref()
            .is_some_and(|recorded| recorded != payment_id)
        {
            tracing::warn!(
                bill_id = %bill.id,
                recorded_payment_id = ?current.payment_id,
                payment_id,
                "bill tied to another payment concurrently"
            );
            return Ok(NotificationOutcome::Mismatch);
        }

        tracing::info!(bill_id = %bill.id, status = %current.status, "bill changed concurrently");
        Ok(if current.status == target {
            NotificationOutcome::Unchanged {
                bill_id: bill.id,
                status: current.status,
            }
        } else {
            NotificationOutcome::Refused {
                bill_id: bill.id,
                current: current.status,
                requested: target,
            }
        })
    }

    /// Set-absolute: repeating the same value is a no-op.
    pub async fn set_disabled(&self, bill_id: Uuid, disabled: bool) -> Result<Bill, ServiceError> {
        let bill = self
            .store
            .set_disabled(bill_id, disabled)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("bill {bill_id}")))?;
        tracing::info!(bill_id = %bill_id, disabled, "bill disabled flag set");
        Ok(bill)
    }

    pub async fn toggle_disabled(&self, bill_id: Uuid) -> Result<Bill, ServiceError> {
        let bill = self
            .store
            .toggle_disabled(bill_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("bill {bill_id}")))?;
        tracing::info!(bill_id = %bill_id, disabled = bill.disabled, "bill disabled flag toggled");
        Ok(bill)
    }

    pub async fn search(&self, query: BillSearchQuery) -> Result<Vec<Bill>, ServiceError> {
        let filter = BillFilter::from_query(query).map_err(ServiceError::Validation)?;
        Ok(self.store.search(&filter).await?)
    }
}

pub fn validate_create(req: &CreateBillRequest) -> Result<(), ServiceError> {
    if req.items.is_empty() {
        return Err(ServiceError::validation("items must not be empty"));
    }

    for (idx, item) in req.items.iter().enumerate() {
        if item.title.trim().is_empty() {
            return Err(ServiceError::validation(format!(
                "items[{idx}].title must not be empty"
            )));
        }
        if item.quantity <= 0 {
            return Err(ServiceError::validation(format!(
                "items[{idx}].quantity must be > 0"
            )));
        }
        if item.unit_price <= Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "items[{idx}].unit_price must be > 0"
            )));
        }
    }

    if items_total(&req.items).is_none() {
        return Err(ServiceError::validation("order total is too large"));
    }

    let email = req.payer.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::validation("payer.email must be a valid email"));
    }

    if req.auto_return.is_some() && req.back_urls.success.trim().is_empty() {
        return Err(ServiceError::validation(
            "back_urls.success is required when auto_return is set",
        ));
    }

    Ok(())
}
