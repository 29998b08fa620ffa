//! End-to-end register flows driven against in-memory collaborators:
//! scan → discount → tender → settle, snapshot replay, and the failure
//! paths that must leave the bon intact.

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;

use casa_core::lines::{LineInput, LineOverrides};
use casa_core::{Customer, CustomerKind, Money, PaymentMethod, Product, Quantity, SgrCategory};
use casa_store::{
    CartStore, DepositLedger, LedgerError, MemoryCatalog, MemoryCustomerDirectory, MemoryStore,
    MockGateway, NullDepositLedger, StoreConfig, StoreError,
};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn product(upc: &str, price_bani: i64, sgr: Option<SgrCategory>) -> Product {
    Product {
        id: format!("id-{}", upc),
        upc: upc.to_string(),
        name: format!("Produs {}", upc),
        price: Money::from_bani(price_bani),
        sgr,
        departament: Some(1),
        clasa: None,
        grupa: None,
        gest: None,
        tax1: None,
        tax2: None,
        tax3: None,
    }
}

fn catalog() -> Arc<MemoryCatalog> {
    Arc::new(MemoryCatalog::with_products(vec![
        product("5941234567890", 1000, None),
        product("5949999000011", 350, Some(SgrCategory::Pet)),
        product("5949999000028", 480, Some(SgrCategory::Sticla)),
    ]))
}

fn fast_config() -> StoreConfig {
    StoreConfig {
        poll_interval: Duration::from_millis(10),
        poll_timeout: Duration::from_millis(200),
        ..StoreConfig::default()
    }
}

fn build_store(gateway: Arc<MockGateway>, snapshots: Arc<MemoryStore>) -> CartStore {
    init_tracing();
    let customers = vec![Customer {
        id: "c-1".to_string(),
        kind: CustomerKind::Pf,
        first_name: Some("Ioana".to_string()),
        last_name: Some("Popescu".to_string()),
        card_id: Some("CARD1234".to_string()),
        discount_percent: Some(5.0),
        nr_auto: None,
    }];
    CartStore::new(
        fast_config(),
        catalog(),
        Arc::new(MemoryCustomerDirectory::with_customers(customers)),
        snapshots,
        gateway,
        Arc::new(NullDepositLedger),
    )
}

/// Ledger double that records every push and optionally fails.
#[derive(Default)]
struct RecordingLedger {
    reports: Mutex<Vec<Vec<(SgrCategory, Quantity)>>>,
    failing: bool,
}

#[async_trait]
impl DepositLedger for RecordingLedger {
    async fn report(
        &self,
        quantities: &[(SgrCategory, Quantity)],
    ) -> Result<(), LedgerError> {
        self.reports
            .lock()
            .unwrap()
            .push(quantities.to_vec());
        if self.failing {
            Err(LedgerError::Unavailable("reconciliation offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn full_sale_settles_and_resets() {
    let gateway = Arc::new(MockGateway::confirming_after(2));
    let store = build_store(gateway.clone(), Arc::new(MemoryStore::default()));

    store
        .add_product_by_upc("5941234567890", Some(Quantity::from_f64(2.0)), LineOverrides::default())
        .await
        .unwrap();
    store
        .add_product_by_upc(
            "5941234567890",
            None,
            LineOverrides {
                percent_discount: Some(10.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    store.with_state(|s| {
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.items[0].qty.millis(), 3000);
        // 30,00 lei at 10% off
        assert_eq!(s.total.bani(), 2700);
    });

    store.set_cash_given(Money::from_bani(5000)).await;
    store.with_state(|s| assert_eq!(s.change.bani(), 2300));

    let receipt = store.settle_payment(PaymentMethod::Cash).await.unwrap();
    assert_eq!(receipt.total.bani(), 2700);
    assert!(gateway.poll_count() >= 3);

    store.with_state(|s| {
        assert!(s.items.is_empty());
        assert!(s.pending_payment.is_none());
        assert_eq!(s.payment_method, Some(PaymentMethod::Cash));
    });
    assert_eq!(store.receipts().len(), 1);
}

#[tokio::test]
async fn confirmation_timeout_keeps_the_bon() {
    let gateway = Arc::new(MockGateway::stalling());
    let store = build_store(gateway, Arc::new(MemoryStore::default()));

    store
        .add_product_by_upc("5941234567890", None, LineOverrides::default())
        .await
        .unwrap();

    let result = store.settle_payment(PaymentMethod::Card).await;
    assert!(matches!(result, Err(StoreError::ConfirmationTimeout { .. })));

    // Outcome unknown: marker cleared, bon deliberately intact.
    store.with_state(|s| {
        assert_eq!(s.items.len(), 1);
        assert!(s.pending_payment.is_none());
    });
    assert!(store.receipts().is_empty());
}

#[tokio::test]
async fn submit_rejection_leaves_state_unchanged() {
    let gateway = Arc::new(MockGateway::rejecting("insufficient funds"));
    let store = build_store(gateway, Arc::new(MemoryStore::default()));

    store
        .add_product_by_upc("5941234567890", None, LineOverrides::default())
        .await
        .unwrap();
    let before = store.state_snapshot();

    let result = store.settle_payment(PaymentMethod::Card).await;
    assert!(matches!(result, Err(StoreError::Settlement(_))));
    assert_eq!(store.state_snapshot(), before);
}

#[tokio::test]
async fn settle_on_empty_bon_is_refused() {
    let store = build_store(Arc::new(MockGateway::confirming()), Arc::new(MemoryStore::default()));
    let result = store.settle_payment(PaymentMethod::Cash).await;
    assert!(matches!(result, Err(StoreError::EmptyCart)));
}

#[tokio::test]
async fn snapshot_replay_restores_the_open_bon() {
    let snapshots = Arc::new(MemoryStore::default());
    {
        let store = build_store(Arc::new(MockGateway::confirming()), snapshots.clone());
        store
            .add_product_by_upc("5949999000011", Some(Quantity::from_f64(2.0)), LineOverrides::default())
            .await
            .unwrap();
        store.set_cash_given(Money::from_bani(1000)).await;
    }

    // A fresh terminal instance over the same blob resumes the bon,
    // with totals recomputed from the line list.
    let store = build_store(Arc::new(MockGateway::confirming()), snapshots);
    store.with_state(|s| {
        assert_eq!(s.items.len(), 2); // merchandise + PET deposit line
        // 2 × 3,50 lei + 2 × 0,50 lei deposit
        assert_eq!(s.total.bani(), 800);
        assert_eq!(s.cash_given.bani(), 1000);
        assert_eq!(s.change.bani(), 200);
    });
}

#[tokio::test]
async fn deposit_lines_follow_the_merchandise() {
    let store = build_store(Arc::new(MockGateway::confirming()), Arc::new(MemoryStore::default()));

    let pet_line = store
        .add_product_by_upc("5949999000011", Some(Quantity::from_f64(3.0)), LineOverrides::default())
        .await
        .unwrap();
    store
        .add_product_by_upc("5949999000028", None, LineOverrides::default())
        .await
        .unwrap();

    store.with_state(|s| {
        let deposits: Vec<_> = s.items.iter().filter(|i| i.is_deposit()).collect();
        assert_eq!(deposits.len(), 2);
        assert!(deposits.iter().any(|d| d.product.id == "1112" && d.qty.millis() == 3000));
        assert!(deposits.iter().any(|d| d.product.id == "1113" && d.qty.millis() == 1000));
    });

    store.remove_item(&pet_line).await.unwrap();
    store.with_state(|s| {
        let deposits: Vec<_> = s.items.iter().filter(|i| i.is_deposit()).collect();
        assert_eq!(deposits.len(), 1);
        assert_eq!(deposits[0].product.id, "1113");
    });
}

#[tokio::test]
async fn deposit_reports_fire_on_composition_change_only() {
    let ledger = Arc::new(RecordingLedger::default());
    let store = CartStore::new(
        fast_config(),
        catalog(),
        Arc::new(MemoryCustomerDirectory::default()),
        Arc::new(MemoryStore::default()),
        Arc::new(MockGateway::confirming()),
        ledger.clone(),
    );

    store
        .add_product_by_upc("5949999000011", None, LineOverrides::default())
        .await
        .unwrap();
    assert_eq!(ledger.reports.lock().unwrap().len(), 1);

    // Cash entry does not touch the deposit composition.
    store.set_cash_given(Money::from_bani(1000)).await;
    assert_eq!(ledger.reports.lock().unwrap().len(), 1);

    // Scanning a non-deposit article does not re-report either.
    store
        .add_product_by_upc("5941234567890", None, LineOverrides::default())
        .await
        .unwrap();
    assert_eq!(ledger.reports.lock().unwrap().len(), 1);

    // Completion empties the bon: zeros are pushed for reconciliation.
    store.complete_payment(PaymentMethod::Cash).await.unwrap();
    let reports = ledger.reports.lock().unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports[1].iter().all(|(_, qty)| qty.is_zero()));
}

#[tokio::test]
async fn ledger_failure_never_blocks_the_mutation() {
    let ledger = Arc::new(RecordingLedger {
        failing: true,
        ..Default::default()
    });
    let store = CartStore::new(
        fast_config(),
        catalog(),
        Arc::new(MemoryCustomerDirectory::default()),
        Arc::new(MemoryStore::default()),
        Arc::new(MockGateway::confirming()),
        ledger,
    );

    store
        .add_product_by_upc("5949999000011", None, LineOverrides::default())
        .await
        .unwrap();
    store.with_state(|s| assert_eq!(s.items.len(), 2));
}

#[tokio::test]
async fn customer_lookup_miss_falls_back_to_anonymous() {
    let store = build_store(Arc::new(MockGateway::confirming()), Arc::new(MemoryStore::default()));

    let known = store.set_customer_by_id("c-1").await.unwrap();
    assert_eq!(known.last_name.as_deref(), Some("Popescu"));
    store.with_state(|s| assert_eq!(s.customer.id, "c-1"));

    let fallback = store.set_customer_by_id("missing").await.unwrap();
    assert_eq!(fallback, Customer::anonymous());
    store.with_state(|s| assert_eq!(s.customer.id, "default"));
}

#[tokio::test]
async fn manual_line_with_value_discount() {
    let store = build_store(Arc::new(MockGateway::confirming()), Arc::new(MemoryStore::default()));
    let mut input = LineInput::for_product(product("manual", 1000, None));
    input.qty = Some(Quantity::from_f64(2.0));
    input.discount = casa_core::Discount::resolve(Some(50.0), Some(Money::from_bani(300)));
    store.add_custom_item(input).await;

    store.with_state(|s| {
        // Value discount wins over percent: 20,00 − 3,00
        assert_eq!(s.total_discount.bani(), 300);
        assert_eq!(s.total.bani(), 1700);
    });
}

#[tokio::test]
async fn reorder_is_local_and_respects_deposits() {
    let store = build_store(Arc::new(MockGateway::confirming()), Arc::new(MemoryStore::default()));
    let first = store
        .add_product_by_upc("5941234567890", None, LineOverrides::default())
        .await
        .unwrap();
    let second = store
        .add_product_by_upc("5949999000011", None, LineOverrides::default())
        .await
        .unwrap();

    store.move_item_up(&second).await.unwrap();
    store.with_state(|s| {
        assert_eq!(s.items[0].id, second);
        assert_eq!(s.items[1].id, first);
        // Deposit summary stays pinned below the merchandise.
        assert!(s.items[2].is_deposit());
    });

    // Top boundary: silent no-op.
    store.move_item_up(&second).await.unwrap();
    store.with_state(|s| assert_eq!(s.items[0].id, second));
}
