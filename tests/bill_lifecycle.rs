use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use storefront_api::domain::bill::{
    AutoReturn, BackUrls, Bill, BillFilter, BillItem, BillSearchQuery, BillStatus,
    CreateBillRequest, Payer,
};
use storefront_api::error::ServiceError;
use storefront_api::gateways::mock::MockGateway;
use storefront_api::gateways::{GatewayPayment, GatewayPaymentStatus};
use storefront_api::repo::bills_repo::BillStore;
use storefront_api::repo::memory::InMemoryBillStore;
use storefront_api::service::bill_service::{BillService, NotificationOutcome};
use uuid::Uuid;

struct Harness {
    service: BillService,
    store: Arc<InMemoryBillStore>,
    gateway: Arc<MockGateway>,
}

fn harness(behavior: &str) -> Harness {
    let store = Arc::new(InMemoryBillStore::new());
    let gateway = Arc::new(MockGateway::new("https://checkout.test/pay", behavior));
    let service = BillService {
        store: store.clone(),
        gateway: gateway.clone(),
        default_notification_url: "https://shop.test/bills/payment/notification".to_string(),
    };
    Harness {
        service,
        store,
        gateway,
    }
}

fn request(email: &str) -> CreateBillRequest {
    CreateBillRequest {
        items: vec![BillItem {
            product_id: Uuid::new_v4(),
            title: "Trail runner".to_string(),
            quantity: 2,
            unit_price: dec!(49.90),
            size: Some("42".to_string()),
        }],
        payer: Payer {
            email: email.to_string(),
            name: Some("Ana".to_string()),
            surname: None,
        },
        back_urls: BackUrls::default(),
        auto_return: None,
        binary_mode: false,
        notification_url: None,
    }
}

fn payment(id: &str, status: GatewayPaymentStatus, bill_id: Uuid) -> GatewayPayment {
    GatewayPayment {
        id: id.to_string(),
        status,
        external_reference: Some(bill_id.to_string()),
    }
}

#[tokio::test]
async fn created_bill_is_pending_and_tied_to_preference() {
    let h = harness("");
    let created = h.service.create_bill(request("ana@example.com")).await.unwrap();

    assert!(created.checkout_url.starts_with("https://checkout.test/pay?pref_id="));

    let bill = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();
    assert_eq!(bill.status, BillStatus::Pending);
    assert!(!bill.disabled);
    assert!(bill.payment_id.is_none());
    assert!(bill.preference_id.is_some());
    assert_eq!(bill.total(), Some(dec!(99.80)));

    let sent = h.gateway.last_preference().unwrap();
    assert_eq!(sent.external_reference, created.bill_id.to_string());
    assert_eq!(
        sent.notification_url,
        "https://shop.test/bills/payment/notification"
    );
}

#[tokio::test]
async fn explicit_notification_url_wins() {
    let h = harness("");
    let mut req = request("ana@example.com");
    req.notification_url = Some("https://hooks.test/mp".to_string());
    h.service.create_bill(req).await.unwrap();

    assert_eq!(
        h.gateway.last_preference().unwrap().notification_url,
        "https://hooks.test/mp"
    );
}

#[tokio::test]
async fn gateway_failure_still_leaves_pending_bill() {
    let h = harness("ALWAYS_FAILURE");
    let out = h.service.create_bill(request("ana@example.com")).await;

    match out {
        Err(ServiceError::Gateway(e)) => {
            assert_eq!(e.status, Some(400));
            assert!(e.payload.is_some());
        }
        other => panic!("expected gateway error, got {other:?}"),
    }

    let bills = h.store.list_all().await.unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].status, BillStatus::Pending);
    assert!(bills[0].preference_id.is_none());
}

#[tokio::test]
async fn invalid_requests_create_nothing() {
    let h = harness("");

    let mut empty = request("ana@example.com");
    empty.items.clear();
    assert!(matches!(
        h.service.create_bill(empty).await,
        Err(ServiceError::Validation(_))
    ));

    let mut zero_qty = request("ana@example.com");
    zero_qty.items[0].quantity = 0;
    assert!(matches!(
        h.service.create_bill(zero_qty).await,
        Err(ServiceError::Validation(_))
    ));

    let mut no_success_url = request("ana@example.com");
    no_success_url.auto_return = Some(AutoReturn::Approved);
    assert!(matches!(
        h.service.create_bill(no_success_url).await,
        Err(ServiceError::Validation(_))
    ));

    assert!(matches!(
        h.service.create_bill(request("not-an-email")).await,
        Err(ServiceError::Validation(_))
    ));

    assert!(h.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn oversized_total_is_rejected_before_insert() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let h = harness("");

    let mut huge = request("ana@example.com");
    huge.items[0].unit_price = Decimal::MAX;
    huge.items[0].quantity = 2;
    assert!(matches!(
        h.service.create_bill(huge).await,
        Err(ServiceError::Validation(_))
    ));

    let mut summed = request("ana@example.com");
    summed.items[0].unit_price = Decimal::MAX;
    summed.items[0].quantity = 1;
    summed.items.push(summed.items[0].clone());
    assert!(matches!(
        h.service.create_bill(summed).await,
        Err(ServiceError::Validation(_))
    ));

    assert!(h.store.list_all().await.unwrap().is_empty());
    assert!(h.gateway.last_preference().is_none());
}

#[tokio::test]
async fn approved_payment_transitions_bill() {
    let h = harness("");
    let created = h.service.create_bill(request("ana@example.com")).await.unwrap();
    h.gateway
        .set_payment(payment("PMT1", GatewayPaymentStatus::Approved, created.bill_id));

    let outcome = h.service.handle_notification("payment", "PMT1").await.unwrap();
    assert_eq!(
        outcome,
        NotificationOutcome::Transitioned {
            bill_id: created.bill_id,
            from: BillStatus::Pending,
            to: BillStatus::Approved,
        }
    );

    let bill = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();
    assert_eq!(bill.status, BillStatus::Approved);
    assert_eq!(bill.payment_id.as_deref(), Some("PMT1"));
}

#[tokio::test]
async fn repeated_notification_is_idempotent() {
    let h = harness("");
    let created = h.service.create_bill(request("ana@example.com")).await.unwrap();
    h.gateway
        .set_payment(payment("PMT1", GatewayPaymentStatus::Approved, created.bill_id));

    h.service.handle_notification("payment", "PMT1").await.unwrap();
    let after_first = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();

    let outcome = h.service.handle_notification("payment", "PMT1").await.unwrap();
    assert_eq!(
        outcome,
        NotificationOutcome::Unchanged {
            bill_id: created.bill_id,
            status: BillStatus::Approved,
        }
    );
    let after_second = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn pending_payment_records_payment_id_without_status_change() {
    let h = harness("");
    let created = h.service.create_bill(request("ana@example.com")).await.unwrap();
    h.gateway
        .set_payment(payment("PMT7", GatewayPaymentStatus::InProcess, created.bill_id));

    let outcome = h.service.handle_notification("payment", "PMT7").await.unwrap();
    assert!(matches!(outcome, NotificationOutcome::Unchanged { .. }));

    let bill = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();
    assert_eq!(bill.status, BillStatus::Pending);
    assert_eq!(bill.payment_id.as_deref(), Some("PMT7"));

    // Later the same payment is approved and found by its recorded id.
    h.gateway
        .set_payment(payment("PMT7", GatewayPaymentStatus::Approved, created.bill_id));
    h.service.handle_notification("payment", "PMT7").await.unwrap();
    let bill = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();
    assert_eq!(bill.status, BillStatus::Approved);
}

#[tokio::test]
async fn non_payment_topic_never_reaches_gateway() {
    let h = harness("");
    let created = h.service.create_bill(request("ana@example.com")).await.unwrap();
    let before = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();

    let outcome = h
        .service
        .handle_notification("merchant_order", "PMT1")
        .await
        .unwrap();
    assert_eq!(outcome, NotificationOutcome::IgnoredTopic);
    assert_eq!(h.gateway.payment_lookups(), 0);

    let after = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn approved_bill_refuses_rejection() {
    let h = harness("");
    let created = h.service.create_bill(request("ana@example.com")).await.unwrap();
    h.gateway
        .set_payment(payment("PMT1", GatewayPaymentStatus::Approved, created.bill_id));
    h.service.handle_notification("payment", "PMT1").await.unwrap();

    h.gateway
        .set_payment(payment("PMT1", GatewayPaymentStatus::Cancelled, created.bill_id));
    let outcome = h.service.handle_notification("payment", "PMT1").await.unwrap();
    assert_eq!(
        outcome,
        NotificationOutcome::Refused {
            bill_id: created.bill_id,
            current: BillStatus::Approved,
            requested: BillStatus::Rejected,
        }
    );

    let bill = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();
    assert_eq!(bill.status, BillStatus::Approved);
}

#[tokio::test]
async fn refund_carries_no_transition() {
    let h = harness("");
    let created = h.service.create_bill(request("ana@example.com")).await.unwrap();
    h.gateway
        .set_payment(payment("PMT1", GatewayPaymentStatus::Refunded, created.bill_id));

    let outcome = h.service.handle_notification("payment", "PMT1").await.unwrap();
    assert_eq!(
        outcome,
        NotificationOutcome::UnmappedStatus(GatewayPaymentStatus::Refunded)
    );
    let bill = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();
    assert_eq!(bill.status, BillStatus::Pending);
}

#[tokio::test]
async fn unknown_payment_reference_is_a_mismatch() {
    let h = harness("");
    h.service.create_bill(request("ana@example.com")).await.unwrap();
    h.gateway.set_payment(GatewayPayment {
        id: "PMT9".to_string(),
        status: GatewayPaymentStatus::Approved,
        external_reference: Some(Uuid::new_v4().to_string()),
    });

    let outcome = h.service.handle_notification("payment", "PMT9").await.unwrap();
    assert_eq!(outcome, NotificationOutcome::Mismatch);
}

#[tokio::test]
async fn bill_tied_to_other_payment_is_a_mismatch() {
    let h = harness("");
    let created = h.service.create_bill(request("ana@example.com")).await.unwrap();
    h.gateway
        .set_payment(payment("PMT1", GatewayPaymentStatus::Pending, created.bill_id));
    h.service.handle_notification("payment", "PMT1").await.unwrap();

    h.gateway
        .set_payment(payment("PMT2", GatewayPaymentStatus::Approved, created.bill_id));
    let outcome = h.service.handle_notification("payment", "PMT2").await.unwrap();
    assert_eq!(outcome, NotificationOutcome::Mismatch);

    let bill = h.store.find_by_id(created.bill_id).await.unwrap().unwrap();
    assert_eq!(bill.status, BillStatus::Pending);
    assert_eq!(bill.payment_id.as_deref(), Some("PMT1"));
}

#[tokio::test]
async fn malformed_payment_id_skips_gateway() {
    let h = harness("");
    let outcome = h
        .service
        .handle_notification("payment", "../../etc/passwd")
        .await
        .unwrap();
    assert_eq!(outcome, NotificationOutcome::Mismatch);
    assert_eq!(h.gateway.payment_lookups(), 0);
}

#[tokio::test]
async fn unknown_gateway_payment_is_an_error() {
    let h = harness("");
    let out = h.service.handle_notification("payment", "NOPE").await;
    assert!(matches!(out, Err(ServiceError::Gateway(_))));
}

#[tokio::test]
async fn set_disabled_is_absolute() {
    let h = harness("");
    let created = h.service.create_bill(request("ana@example.com")).await.unwrap();

    assert!(h.service.set_disabled(created.bill_id, true).await.unwrap().disabled);
    assert!(h.service.set_disabled(created.bill_id, true).await.unwrap().disabled);
    assert!(!h.service.set_disabled(created.bill_id, false).await.unwrap().disabled);
    assert!(!h.service.set_disabled(created.bill_id, false).await.unwrap().disabled);
}

#[tokio::test]
async fn toggle_disabled_flips_both_ways() {
    let h = harness("");
    let created = h.service.create_bill(request("ana@example.com")).await.unwrap();

    assert!(h.service.toggle_disabled(created.bill_id).await.unwrap().disabled);
    assert!(!h.service.toggle_disabled(created.bill_id).await.unwrap().disabled);
}

#[tokio::test]
async fn disabling_unknown_bill_is_not_found() {
    let h = harness("");
    let id = Uuid::new_v4();
    assert!(matches!(
        h.service.set_disabled(id, true).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        h.service.toggle_disabled(id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn search_combines_filters() {
    let h = harness("");
    let a = h.service.create_bill(request("ana@example.com")).await.unwrap();
    let b = h.service.create_bill(request("ana@example.com")).await.unwrap();
    let c = h.service.create_bill(request("bob@example.com")).await.unwrap();

    h.gateway
        .set_payment(payment("PA", GatewayPaymentStatus::Approved, a.bill_id));
    h.service.handle_notification("payment", "PA").await.unwrap();
    h.gateway
        .set_payment(payment("PB", GatewayPaymentStatus::Rejected, b.bill_id));
    h.service.handle_notification("payment", "PB").await.unwrap();
    h.service.set_disabled(c.bill_id, true).await.unwrap();

    let all = h.service.search(BillSearchQuery::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let by_email = h
        .service
        .search(BillSearchQuery {
            email: Some("ANA@example.com".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_email.len(), 2);

    let all_three = h
        .service
        .search(BillSearchQuery {
            email: Some("ana@example.com".to_string()),
            status: Some("approved".to_string()),
            id_payment: Some("PA".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(all_three.len(), 1);
    assert_eq!(all_three[0].id, a.bill_id);

    let conflicting = h
        .service
        .search(BillSearchQuery {
            email: Some("ana@example.com".to_string()),
            status: Some("approved".to_string()),
            id_payment: Some("PB".to_string()),
        })
        .await
        .unwrap();
    assert!(conflicting.is_empty());

    let disabled = h
        .service
        .search(BillSearchQuery {
            status: Some("disabled".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(disabled.len(), 1);
    assert_eq!(disabled[0].id, c.bill_id);

    assert!(matches!(
        h.service
            .search(BillSearchQuery {
                status: Some("paid".to_string()),
                ..Default::default()
            })
            .await,
        Err(ServiceError::Validation(_))
    ));
}

/// Lets another payment claim the bill right before the first conditional
/// update, so that update matches nothing.
struct RacingBillStore {
    inner: InMemoryBillStore,
    rival: String,
    fired: AtomicBool,
}

#[async_trait::async_trait]
impl BillStore for RacingBillStore {
    async fn insert(&self, bill: &Bill) -> anyhow::Result<()> {
        self.inner.insert(bill).await
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Bill>> {
        self.inner.list_all().await
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Bill>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> anyhow::Result<Option<Bill>> {
        self.inner.find_by_payment_id(payment_id).await
    }

    async fn attach_preference(&self, id: Uuid, preference_id: &str) -> anyhow::Result<()> {
        self.inner.attach_preference(id, preference_id).await
    }

    async fn apply_payment_status(
        &self,
        id: Uuid,
        payment_id: &str,
        expected: BillStatus,
        next: BillStatus,
    ) -> anyhow::Result<bool> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.inner
                .apply_payment_status(id, &self.rival, expected, expected)
                .await?;
        }
        self.inner
            .apply_payment_status(id, payment_id, expected, next)
            .await
    }

    async fn set_disabled(&self, id: Uuid, disabled: bool) -> anyhow::Result<Option<Bill>> {
        self.inner.set_disabled(id, disabled).await
    }

    async fn toggle_disabled(&self, id: Uuid) -> anyhow::Result<Option<Bill>> {
        self.inner.toggle_disabled(id).await
    }

    async fn search(&self, filter: &BillFilter) -> anyhow::Result<Vec<Bill>> {
        self.inner.search(filter).await
    }
}

async fn racing_setup(status: GatewayPaymentStatus) -> (BillService, Arc<RacingBillStore>, Uuid) {
    let store = Arc::new(RacingBillStore {
        inner: InMemoryBillStore::new(),
        rival: "RIVAL".to_string(),
        fired: AtomicBool::new(false),
    });
    let gateway = Arc::new(MockGateway::new("https://checkout.test/pay", ""));
    let service = BillService {
        store: store.clone(),
        gateway: gateway.clone(),
        default_notification_url: "https://shop.test/bills/payment/notification".to_string(),
    };
    let created = service.create_bill(request("ana@example.com")).await.unwrap();
    gateway.set_payment(payment("PMT1", status, created.bill_id));
    (service, store, created.bill_id)
}

#[tokio::test]
async fn losing_payment_id_race_without_status_change_is_a_mismatch() {
    let (service, store, bill_id) = racing_setup(GatewayPaymentStatus::Pending).await;

    let outcome = service.handle_notification("payment", "PMT1").await.unwrap();
    assert_eq!(outcome, NotificationOutcome::Mismatch);

    let bill = store.find_by_id(bill_id).await.unwrap().unwrap();
    assert_eq!(bill.status, BillStatus::Pending);
    assert_eq!(bill.payment_id.as_deref(), Some("RIVAL"));
}

#[tokio::test]
async fn losing_transition_race_to_other_payment_is_a_mismatch() {
    let (service, store, bill_id) = racing_setup(GatewayPaymentStatus::Approved).await;

    let outcome = service.handle_notification("payment", "PMT1").await.unwrap();
    assert_eq!(outcome, NotificationOutcome::Mismatch);

    let bill = store.find_by_id(bill_id).await.unwrap().unwrap();
    assert_eq!(bill.status, BillStatus::Pending);
    assert_eq!(bill.payment_id.as_deref(), Some("RIVAL"));
}
