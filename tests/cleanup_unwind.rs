//! Cleanup stack invariants: reverse-acquisition order, exactly-once
//! execution, and failure isolation.

use std::sync::{Arc, Mutex};

use migcheck::cleanup::CleanupStack;
use migcheck_test_utils::init_tracing;
use proptest::prelude::*;

#[tokio::test]
async fn interleaved_registration_unwinds_in_reverse() {
    init_tracing();

    let order = Arc::new(Mutex::new(Vec::new()));
    let mut stack = CleanupStack::new();

    let labels = ["container", "env-file", "build-log", "data-dir", "subject"];
    for label in labels {
        let order = Arc::clone(&order);
        stack.register(label, move || async move {
            order.lock().unwrap().push(label);
            Ok(())
        });
    }

    stack.run_all().await;

    let got = order.lock().unwrap().clone();
    let expected: Vec<_> = labels.iter().rev().copied().collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn every_action_runs_even_when_half_of_them_fail() {
    init_tracing();

    let ran = Arc::new(Mutex::new(0usize));
    let mut stack = CleanupStack::new();

    for i in 0..10 {
        let ran = Arc::clone(&ran);
        stack.register(format!("action-{i}"), move || async move {
            *ran.lock().unwrap() += 1;
            if i % 2 == 0 {
                anyhow::bail!("teardown {i} failed")
            }
            Ok(())
        });
    }

    stack.run_all().await;
    assert_eq!(*ran.lock().unwrap(), 10);
}

proptest! {
    // For any number of registered actions, unwinding visits each exactly
    // once, in strict reverse-acquisition order, regardless of which
    // actions fail.
    #[test]
    fn unwind_order_property(count in 1usize..24, failures in proptest::collection::vec(any::<bool>(), 24)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let order = rt.block_on(async {
            let order = Arc::new(Mutex::new(Vec::new()));
            let mut stack = CleanupStack::new();

            for i in 0..count {
                let order = Arc::clone(&order);
                let fail = failures[i];
                stack.register(format!("action-{i}"), move || async move {
                    order.lock().unwrap().push(i);
                    if fail {
                        anyhow::bail!("scripted teardown failure")
                    }
                    Ok(())
                });
            }

            stack.run_all().await;
            // a second unwind must be a no-op
            stack.run_all().await;

            Arc::try_unwrap(order).unwrap().into_inner().unwrap()
        });

        let expected: Vec<usize> = (0..count).rev().collect();
        prop_assert_eq!(order, expected);
    }
}
