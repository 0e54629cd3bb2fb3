use std::sync::atomic::Ordering;

use billing_console::{error::ApiError, models::tenant::TENANT_COLUMNS};

use crate::support::{session, tenant, Harness};

#[tokio::test]
async fn test_view_is_loading_until_first_fetch() {
    let harness = Harness::new(vec![tenant("t1", 1.0)]);

    let table = harness.view.render().await;
    assert!(table.is_loading);
    assert!(table.rows.is_empty());
}

#[tokio::test]
async fn test_successful_load_renders_one_row_per_tenant() {
    let harness = Harness::new(vec![
        tenant("t1", 100.0),
        tenant("t2", 0.0),
        tenant("t3", 12.5),
    ]);

    let count = harness.view.load(&session()).await.unwrap();
    let table = harness.view.render().await;

    assert_eq!(count, 3);
    assert!(!table.is_loading);
    assert!(table.load_error.is_none());
    assert_eq!(table.columns, TENANT_COLUMNS.to_vec());
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[2].tenant.tenant_balance, 12.5);
    assert_eq!(table.rows[0].add_credits.href, "/api/v1/tenants/t1/credits");
}

#[tokio::test]
async fn test_failed_load_clears_loading_and_keeps_rows_empty() {
    let harness = Harness::new(vec![tenant("t1", 100.0)]);
    harness.tenants.fail_fetch.store(true, Ordering::SeqCst);

    let result = harness.view.load(&session()).await;
    let table = harness.view.render().await;

    assert!(matches!(result, Err(ApiError::TenantApi(_))));
    assert!(!table.is_loading);
    assert!(table.rows.is_empty());
    assert!(table.load_error.is_some());
}

#[tokio::test]
async fn test_ensure_loaded_fetches_once_and_retries_after_failure() {
    let harness = Harness::new(vec![tenant("t1", 100.0)]);
    harness.tenants.fail_fetch.store(true, Ordering::SeqCst);

    assert!(harness.view.ensure_loaded(&session()).await.is_err());

    harness.tenants.fail_fetch.store(false, Ordering::SeqCst);
    harness.view.ensure_loaded(&session()).await.unwrap();
    harness.view.ensure_loaded(&session()).await.unwrap();

    assert_eq!(harness.tenants.fetch_calls.load(Ordering::SeqCst), 2);
    assert!(harness.view.render().await.load_error.is_none());
}

#[tokio::test]
async fn test_reload_replaces_drifted_balances() {
    let harness = Harness::loaded(vec![tenant("t1", 100.0)]).await;

    harness.view.apply_credit("t1", 50.0).await.unwrap();
    assert_eq!(harness.balance("t1").await, 150.0);

    harness.view.load(&session()).await.unwrap();
    assert_eq!(harness.balance("t1").await, 100.0);
}

#[tokio::test]
async fn test_apply_credit_to_unknown_tenant_is_none() {
    let harness = Harness::loaded(vec![tenant("t1", 100.0)]).await;

    assert!(harness.view.apply_credit("nope", 20.0).await.is_none());
}
