mod common;

use std::collections::BTreeSet;

use findata_backend::entities::{index_constituents, prelude::*};
use findata_backend::error::StoreError;
use findata_backend::services::membership::ChangeType;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::common::{date, register_test_index, setup_membership, snapshot, snapshot_row};

fn symbols(models: &[index_constituents::Model]) -> Vec<&str> {
    models.iter().map(|m| m.symbol.as_str()).collect()
}

/// Initial reconciliation opens one interval per snapshot symbol.
#[tokio::test]
async fn test_initial_reconciliation_opens_intervals() {
    let (_db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    let effective = date(2024, 1, 1);
    let summary = membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT", "GOOGL"]), None, Some(effective))
        .await
        .unwrap();

    assert_eq!(summary.added_count, 3);
    assert_eq!(summary.removed_count, 0);
    assert_eq!(summary.unchanged_count, 0);
    assert_eq!(summary.added_symbols, vec!["AAPL", "GOOGL", "MSFT"]);

    let current = membership.current("SP500").await.unwrap();
    assert_eq!(symbols(&current), vec!["AAPL", "GOOGL", "MSFT"]);
    for interval in &current {
        assert_eq!(interval.effective_date, effective);
        assert_eq!(interval.end_date, None);
        assert_eq!(
            interval.company_name,
            Some(format!("{} Corp", interval.symbol))
        );
    }
}

/// Second snapshot closes departed members and opens new ones.
#[tokio::test]
async fn test_reconciliation_applies_membership_changes() {
    let (db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT", "GOOGL"]), None, Some(date(2024, 1, 1)))
        .await
        .unwrap();
    let summary = membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT", "TSLA"]), None, Some(date(2024, 6, 1)))
        .await
        .unwrap();

    assert_eq!(summary.added_symbols, vec!["TSLA"]);
    assert_eq!(summary.removed_symbols, vec!["GOOGL"]);
    assert_eq!(summary.unchanged_count, 2);

    let current = membership.current("SP500").await.unwrap();
    assert_eq!(symbols(&current), vec!["AAPL", "MSFT", "TSLA"]);

    let googl = IndexConstituents::find()
        .filter(index_constituents::Column::Symbol.eq("GOOGL"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(googl.end_date, Some(date(2024, 6, 1)));
    assert_eq!(googl.effective_date, date(2024, 1, 1));
}

/// As-of queries reconstruct the membership between two reconciliations.
#[tokio::test]
async fn test_as_of_returns_past_membership() {
    let (_db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT", "GOOGL"]), None, Some(date(2024, 1, 1)))
        .await
        .unwrap();
    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT", "TSLA"]), None, Some(date(2024, 6, 1)))
        .await
        .unwrap();

    let past = membership.as_of("SP500", date(2024, 3, 1)).await.unwrap();
    assert_eq!(symbols(&past), vec!["AAPL", "GOOGL", "MSFT"]);

    // Stability: no reconciliation between the two dates, same answer
    let later = membership.as_of("SP500", date(2024, 5, 30)).await.unwrap();
    assert_eq!(symbols(&past), symbols(&later));

    // Before tracking began there is no membership at all
    let before = membership.as_of("SP500", date(2023, 12, 31)).await.unwrap();
    assert!(before.is_empty());
}

/// is_member agrees with as_of on both sides of a removal.
#[tokio::test]
async fn test_is_member_matches_as_of() {
    let (_db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT", "GOOGL"]), None, Some(date(2024, 1, 1)))
        .await
        .unwrap();
    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT", "TSLA"]), None, Some(date(2024, 6, 1)))
        .await
        .unwrap();

    assert!(membership.is_member("GOOGL", "SP500", Some(date(2024, 3, 1))).await.unwrap());
    assert!(!membership.is_member("GOOGL", "SP500", Some(date(2024, 7, 1))).await.unwrap());
    // end_date is exclusive: on the removal day the symbol is already out
    assert!(!membership.is_member("GOOGL", "SP500", Some(date(2024, 6, 1))).await.unwrap());

    for probe in ["AAPL", "GOOGL", "MSFT", "TSLA"] {
        for day in [date(2024, 3, 1), date(2024, 7, 1)] {
            let via_as_of = membership
                .as_of("SP500", day)
                .await
                .unwrap()
                .iter()
                .any(|m| m.symbol == probe);
            let direct = membership.is_member(probe, "SP500", Some(day)).await.unwrap();
            assert_eq!(direct, via_as_of, "{} on {}", probe, day);
        }
    }
}

/// Change history reports both sides of a swap, newest first.
#[tokio::test]
async fn test_changes_reports_additions_and_removals() {
    let (_db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT", "GOOGL"]), None, Some(date(2024, 1, 1)))
        .await
        .unwrap();
    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT", "TSLA"]), None, Some(date(2024, 6, 1)))
        .await
        .unwrap();

    let changes = membership
        .changes("SP500", Some(date(2024, 1, 1)), Some(date(2024, 12, 31)))
        .await
        .unwrap();

    assert!(changes.iter().any(|event| {
        event.symbol == "TSLA"
            && event.change_type == ChangeType::Added
            && event.date == date(2024, 6, 1)
    }));
    assert!(changes.iter().any(|event| {
        event.symbol == "GOOGL"
            && event.change_type == ChangeType::Removed
            && event.date == date(2024, 6, 1)
    }));

    // Newest first
    assert!(changes.windows(2).all(|pair| pair[0].date >= pair[1].date));

    // Narrowing the window to the first snapshot hides the June swap
    let early = membership
        .changes("SP500", Some(date(2024, 1, 1)), Some(date(2024, 5, 31)))
        .await
        .unwrap();
    assert!(early.iter().all(|event| event.change_type == ChangeType::Added));
    assert_eq!(early.len(), 3);
}

/// Reconciling an unknown code never auto-registers.
#[tokio::test]
async fn test_unregistered_index_is_rejected() {
    let (_db, registry, membership) = setup_membership().await;

    let err = membership
        .reconcile("NOPE", &snapshot(&["AAPL"]), None, Some(date(2024, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotRegistered(code) if code == "NOPE"));

    assert!(matches!(
        membership.current("NOPE").await.unwrap_err(),
        StoreError::NotRegistered(_)
    ));
    assert!(matches!(
        membership.as_of("NOPE", date(2024, 1, 1)).await.unwrap_err(),
        StoreError::NotRegistered(_)
    ));

    // And nothing got created along the way
    assert!(registry.resolve("NOPE").await.unwrap().is_none());
}

/// Reconciling the same snapshot twice is a no-op the second time.
#[tokio::test]
async fn test_reconciliation_is_idempotent() {
    let (db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    let effective = date(2024, 1, 1);
    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT"]), None, Some(effective))
        .await
        .unwrap();

    let before = IndexConstituents::find().all(&db).await.unwrap();

    let summary = membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT"]), None, Some(effective))
        .await
        .unwrap();
    assert_eq!(summary.added_count, 0);
    assert_eq!(summary.removed_count, 0);
    assert_eq!(summary.unchanged_count, 2);

    let after = IndexConstituents::find().all(&db).await.unwrap();
    assert_eq!(before, after);
}

/// A symbol that leaves and returns gets a second interval; the old closed
/// row stays closed and only one interval is ever open.
#[tokio::test]
async fn test_re_entry_creates_new_interval() {
    let (db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    membership
        .reconcile("SP500", &snapshot(&["AAPL", "GOOGL"]), None, Some(date(2024, 1, 1)))
        .await
        .unwrap();
    membership
        .reconcile("SP500", &snapshot(&["AAPL"]), None, Some(date(2024, 3, 1)))
        .await
        .unwrap();
    membership
        .reconcile("SP500", &snapshot(&["AAPL", "GOOGL"]), None, Some(date(2024, 9, 1)))
        .await
        .unwrap();

    let googl_intervals = IndexConstituents::find()
        .filter(index_constituents::Column::Symbol.eq("GOOGL"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(googl_intervals.len(), 2);

    let open: Vec<_> = googl_intervals.iter().filter(|m| m.end_date.is_none()).collect();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].effective_date, date(2024, 9, 1));

    let closed: Vec<_> = googl_intervals.iter().filter(|m| m.end_date.is_some()).collect();
    assert_eq!(closed[0].effective_date, date(2024, 1, 1));
    assert_eq!(closed[0].end_date, Some(date(2024, 3, 1)));

    // Both of GOOGL's stints are visible as history
    assert!(membership.is_member("GOOGL", "SP500", Some(date(2024, 2, 1))).await.unwrap());
    assert!(!membership.is_member("GOOGL", "SP500", Some(date(2024, 5, 1))).await.unwrap());
    assert!(membership.is_member("GOOGL", "SP500", Some(date(2024, 10, 1))).await.unwrap());
}

/// After any sequence of reconciliations no (index, symbol) pair has more
/// than one open interval.
#[tokio::test]
async fn test_no_double_open_intervals() {
    let (db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    let passes: [(&[&str], (i32, u32, u32)); 5] = [
        (&["AAPL", "MSFT", "GOOGL"], (2024, 1, 1)),
        (&["AAPL", "TSLA"], (2024, 2, 1)),
        (&["AAPL", "TSLA"], (2024, 3, 1)),
        (&["MSFT", "TSLA"], (2024, 4, 1)),
        (&["AAPL", "MSFT", "GOOGL"], (2024, 5, 1)),
    ];
    for (symbols, (y, m, d)) in passes {
        membership
            .reconcile("SP500", &snapshot(symbols), None, Some(date(y, m, d)))
            .await
            .unwrap();
    }

    let all = IndexConstituents::find().all(&db).await.unwrap();
    let mut open_pairs = BTreeSet::new();
    for interval in all.iter().filter(|m| m.end_date.is_none()) {
        assert!(
            open_pairs.insert((interval.index_id, interval.symbol.clone())),
            "duplicate open interval for {}",
            interval.symbol
        );
    }

    // Final state matches the last snapshot exactly
    let current = membership.current("SP500").await.unwrap();
    assert_eq!(symbols(&current), vec!["AAPL", "GOOGL", "MSFT"]);
}

/// A reconciliation that fails midway leaves the store untouched.
#[tokio::test]
async fn test_failed_reconciliation_rolls_back() {
    let (db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT", "XOM"]), None, Some(date(2024, 1, 1)))
        .await
        .unwrap();
    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT"]), None, Some(date(2024, 2, 1)))
        .await
        .unwrap();

    let before = IndexConstituents::find().all(&db).await.unwrap();

    // Re-adding XOM dated 2024-01-01 collides with its closed interval's
    // uniqueness key after MSFT's closure already ran inside the transaction.
    let err = membership
        .reconcile("SP500", &snapshot(&["AAPL", "XOM"]), None, Some(date(2024, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Db { .. }));

    // Everything rolled back: MSFT still open, XOM still closed
    let after = IndexConstituents::find().all(&db).await.unwrap();
    assert_eq!(before, after);

    let current = membership.current("SP500").await.unwrap();
    assert_eq!(symbols(&current), vec!["AAPL", "MSFT"]);
}

/// Closing an interval before it started is refused and rolled back.
#[tokio::test]
async fn test_backdated_closure_is_rejected() {
    let (db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    membership
        .reconcile("SP500", &snapshot(&["AAPL"]), None, Some(date(2024, 6, 1)))
        .await
        .unwrap();

    let err = membership
        .reconcile("SP500", &snapshot(&["MSFT"]), None, Some(date(2024, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidInterval { .. }));

    // AAPL untouched, MSFT never inserted
    let all = IndexConstituents::find().all(&db).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].symbol, "AAPL");
    assert_eq!(all[0].end_date, None);
}

/// Empty or all-invalid snapshots must not close out the whole index.
#[tokio::test]
async fn test_empty_snapshot_is_refused() {
    let (_db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    membership
        .reconcile("SP500", &snapshot(&["AAPL", "MSFT"]), None, Some(date(2024, 1, 1)))
        .await
        .unwrap();

    let err = membership
        .reconcile("SP500", &[], None, Some(date(2024, 2, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::EmptySnapshot { .. }));

    let mut blank = snapshot_row("AAPL");
    blank.symbol = "   ".to_string();
    let err = membership
        .reconcile("SP500", &[blank], None, Some(date(2024, 2, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::EmptySnapshot { .. }));

    let current = membership.current("SP500").await.unwrap();
    assert_eq!(current.len(), 2);
}

/// Rows without symbols are dropped, the rest of the snapshot still applies.
#[tokio::test]
async fn test_partial_snapshot_drops_invalid_rows() {
    let (_db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    let mut rows = snapshot(&["AAPL", "MSFT"]);
    let mut blank = snapshot_row("JUNK");
    blank.symbol = String::new();
    rows.push(blank);

    let summary = membership
        .reconcile("SP500", &rows, None, Some(date(2024, 1, 1)))
        .await
        .unwrap();
    assert_eq!(summary.added_count, 2);
}

/// Registry upsert is idempotent and surfaces the same id.
#[tokio::test]
async fn test_registry_register_or_update() {
    let (_db, registry, _membership) = setup_membership().await;

    let first = registry
        .register_or_update("SP500", "S&P 500", "desc", "US", "wikipedia", "equity")
        .await
        .unwrap();
    let second = registry
        .register_or_update("SP500", "S&P 500 (renamed)", "desc", "US", "wikipedia", "equity")
        .await
        .unwrap();
    assert_eq!(first, second);

    register_test_index(&registry, "DOW30").await;

    let listed = registry.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    // Ordered by code
    assert_eq!(listed[0].index_code, "DOW30");
    assert_eq!(listed[1].index_code, "SP500");
    assert_eq!(listed[1].index_name, "S&P 500 (renamed)");

    assert_eq!(registry.resolve("SP500").await.unwrap(), Some(first));
    assert_eq!(registry.resolve("MISSING").await.unwrap(), None);
    assert!(matches!(
        registry.require("MISSING").await.unwrap_err(),
        StoreError::NotRegistered(_)
    ));
}

/// Duplicate symbols inside one snapshot collapse to a single interval.
#[tokio::test]
async fn test_duplicate_snapshot_symbols_collapse() {
    let (db, registry, membership) = setup_membership().await;
    register_test_index(&registry, "SP500").await;

    let mut rows = snapshot(&["AAPL"]);
    let mut dup = snapshot_row("AAPL");
    dup.company_name = Some("Apple Duplicate".to_string());
    rows.push(dup);

    let summary = membership
        .reconcile("SP500", &rows, None, Some(date(2024, 1, 1)))
        .await
        .unwrap();
    assert_eq!(summary.added_count, 1);

    let stored = IndexConstituents::find().all(&db).await.unwrap();
    assert_eq!(stored.len(), 1);
    // First occurrence wins
    assert_eq!(stored[0].company_name.as_deref(), Some("AAPL Corp"));
}
