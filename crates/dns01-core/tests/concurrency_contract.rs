//! Contract Test: Concurrent Challenges
//!
//! The host solves many challenges at once with one solver instance.
//!
//! Constraints verified:
//! - The solver is shareable across tasks
//! - Concurrent Presents for different keys under one name each get their
//!   own record
//! - Concurrent CleanUps remove exactly their own records

mod common;

use common::*;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_keys_under_one_name() {
    let harness = Arc::new(Harness::new().await);
    let keys: Vec<String> = (0..8).map(|i| format!("token-{}", i)).collect();

    let mut handles = Vec::new();
    for key in &keys {
        let solver = Arc::clone(&harness.solver);
        let request = challenge(key);
        handles.push(tokio::spawn(async move { solver.present(&request).await }));
    }
    for handle in handles {
        handle.await.expect("task completes").expect("present succeeds");
    }

    assert_eq!(harness.txt_records("_acme-challenge").await.len(), keys.len());

    // Clean up half of them concurrently
    let mut handles = Vec::new();
    for key in keys.iter().take(4) {
        let solver = Arc::clone(&harness.solver);
        let request = challenge(key);
        handles.push(tokio::spawn(async move { solver.clean_up(&request).await }));
    }
    for handle in handles {
        handle.await.expect("task completes").expect("clean up succeeds");
    }

    let mut remaining: Vec<String> = harness
        .txt_records("_acme-challenge")
        .await
        .into_iter()
        .map(|r| r.value)
        .collect();
    remaining.sort();
    assert_eq!(remaining, keys[4..].to_vec());
}
