mod common;

use common::{drive, session, settle, spawn_backend, wait_until, Shared};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn refresh_loop_polls_until_teardown() {
    let state = Shared::default();
    state.lock().unwrap().listing = vec![json!({ "id": 1, "filename": "alpha" }), json!({ "id": 2, "filename": "beta" })];
    let base = spawn_backend(state.clone()).await;
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session(&base, tmp.path()).with_refresh_interval(Duration::from_millis(50));

    s.start();
    drive(&mut s, Duration::from_secs(5), |_| state.lock().unwrap().listing_calls >= 3).await;
    assert_eq!(s.selector.listing().len(), 2);
    assert!(s.refresh_running());

    s.teardown();
    assert!(!s.refresh_running());
    settle(&mut s, Duration::from_millis(50)).await;
    let calls = state.lock().unwrap().listing_calls;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.lock().unwrap().listing_calls, calls);
}

#[tokio::test]
async fn first_listing_is_immediate() {
    let state = Shared::default();
    state.lock().unwrap().listing = vec![json!({ "id": 7, "filename": "gamma" })];
    let base = spawn_backend(state.clone()).await;
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session(&base, tmp.path());

    s.start();
    drive(&mut s, Duration::from_secs(2), |s| !s.selector.listing().is_empty()).await;
    assert_eq!(s.selector.listing()[0].id, 7);
    s.teardown();
}

#[tokio::test]
async fn toggles_push_the_whole_set() {
    let state = Shared::default();
    let base = spawn_backend(state.clone()).await;
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session(&base, tmp.path());

    s.toggle_database(4);
    s.toggle_database(5);
    s.toggle_database(4);
    assert_eq!(s.selector.selected(), &[5]);

    let pushed = wait_until(Duration::from_secs(2), || {
        state.lock().unwrap().selections.last().map(Vec::as_slice) == Some(&[5][..])
    })
    .await;
    assert!(pushed);
    let g = state.lock().unwrap();
    assert_eq!(g.selections.last().unwrap(), &vec![5]);
    assert!(g.selections.len() <= 3);
}

#[tokio::test]
async fn failed_push_keeps_local_selection() {
    let state = Shared::default();
    state.lock().unwrap().selection_status = Some(500);
    let base = spawn_backend(state.clone()).await;
    let tmp = tempfile::tempdir().unwrap();
    let mut s = session(&base, tmp.path());

    s.set_database_checked(5, true);
    assert!(wait_until(Duration::from_secs(2), || !state.lock().unwrap().selections.is_empty()).await);
    let notices = settle(&mut s, Duration::from_millis(50)).await;

    assert!(notices.is_empty());
    assert!(s.selector.is_selected(5));
}

#[tokio::test]
async fn listing_failure_keeps_previous_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let state = Shared::default();
    state.lock().unwrap().listing = vec![json!({ "id": 1, "filename": "alpha" })];
    let base = spawn_backend(state.clone()).await;
    let mut s = session(&base, tmp.path());
    s.refresh_databases();
    drive(&mut s, Duration::from_secs(2), |s| !s.selector.listing().is_empty()).await;

    let mut offline = session("http://127.0.0.1:9", tmp.path());
    offline.selector.replace_listing(s.selector.listing().to_vec());
    offline.refresh_databases();
    settle(&mut offline, Duration::from_millis(300)).await;
    assert_eq!(offline.selector.listing().len(), 1);
}
