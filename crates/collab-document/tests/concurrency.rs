//! Gate behaviour under concurrent callers

mod common;

use std::time::Duration;

use collab_document::{DocumentHandle, NodeAction};
use common::{meta_of, probed_handle, until_locked};
use serde_json::json;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn engine_calls_never_overlap() {
    let (handle, probe) = probed_handle("exclusion");
    handle.init_empty_doc().await.unwrap();
    probe.stall(Duration::from_millis(2));

    let mut tasks = Vec::new();
    for i in 0..16_i64 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            let tag = format!("t{i}");
            assert!(handle.push_meta_array_item("tags", &tag).await.is_some());
            assert!(handle.set_meta_int(&format!("k{i}"), i).await.is_some());
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(probe.max_in_flight(), 1);
    let meta = meta_of(&handle).await;
    assert_eq!(meta["tags"].as_array().map(Vec::len), Some(16));
    assert_eq!(meta["k15"], json!(15));
    assert!(!handle.is_locked());
    assert_eq!(handle.waiters(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn gate_reopens_after_failures() {
    let (handle, probe) = probed_handle("failures");
    handle.init_empty_doc().await.unwrap();
    handle.set_meta_string("title", "Note").await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            match i % 4 {
                0 => assert!(handle.push_meta_array_item("title", "x").await.is_none()),
                1 => assert!(handle.apply_action(&[NodeAction::delete("ghost")]).await.is_none()),
                2 => assert!(handle.set_meta_from_json("[1]").await.is_none()),
                _ => assert!(handle.push_meta_array_item("seen", &i.to_string()).await.is_some()),
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert!(!handle.is_locked());

    probe.fail(true);
    let mut tasks = Vec::new();
    for i in 0..8 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                assert!(handle.get_document_state().await.unwrap_err().is_fatal());
            } else {
                assert!(handle.set_meta_string("title", "Lost").await.is_none());
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    probe.fail(false);

    assert!(!handle.is_locked());
    assert_eq!(handle.waiters(), 0);
    let meta = meta_of(&handle).await;
    assert_eq!(meta["title"], json!("Note"));
    assert_eq!(meta["seen"].as_array().map(Vec::len), Some(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_waiter_never_runs() {
    let (handle, probe) = probed_handle("cancel");
    handle.init_empty_doc().await.unwrap();
    probe.stall(Duration::from_millis(150));

    let holder = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.set_meta_int("slow", 1).await })
    };
    until_locked(&handle).await;

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), handle.set_meta_int("cancelled", 2)).await;
    assert!(timed_out.is_err());
    assert_eq!(handle.waiters(), 0);

    assert!(holder.await.unwrap().is_some());
    probe.stall(Duration::ZERO);
    assert!(!handle.is_locked());

    let meta = meta_of(&handle).await;
    assert_eq!(meta["slow"], json!(1));
    assert!(meta.get("cancelled").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn aborted_waiters_leave_the_queue() {
    let (handle, probe) = probed_handle("abort");
    handle.init_empty_doc().await.unwrap();
    probe.stall(Duration::from_millis(100));

    let holder = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.set_meta_bool("held", true).await })
    };
    until_locked(&handle).await;

    let waiters: Vec<_> = (0..3)
        .map(|i| {
            let handle = handle.clone();
            tokio::spawn(async move { handle.set_meta_int(&format!("w{i}"), i).await })
        })
        .collect();
    while handle.waiters() < 3 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    for waiter in &waiters {
        waiter.abort();
    }
    for waiter in waiters {
        assert!(waiter.await.unwrap_err().is_cancelled());
    }
    assert_eq!(handle.waiters(), 0);

    assert!(holder.await.unwrap().is_some());
    probe.stall(Duration::ZERO);
    assert!(handle.set_meta_int("after", 1).await.is_some());
    assert!(!handle.is_locked());

    let meta = meta_of(&handle).await;
    assert!(meta.get("w0").is_none());
    assert_eq!(meta["after"], json!(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn merge_ignores_the_gate() {
    let author = DocumentHandle::new().await.unwrap();
    let base = author.init_empty_doc().await.unwrap();
    let u1 = author.set_meta_int("a", 1).await.unwrap();
    let u2 = author.set_meta_int("b", 2).await.unwrap();
    let isolated = author.merge_updates(&[u1.clone(), u2.clone()]).unwrap();

    let (handle, probe) = probed_handle("merge");
    handle.init_empty_doc().await.unwrap();
    probe.stall(Duration::from_millis(200));
    let holder = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.set_meta_string("busy", "yes").await })
    };
    until_locked(&handle).await;

    let mut merges = Vec::new();
    for _ in 0..8 {
        let handle = handle.clone();
        let updates = vec![u1.clone(), u2.clone()];
        merges.push(tokio::spawn(async move { handle.merge_updates(&updates) }));
    }
    let mut merged = Vec::new();
    for merge in merges {
        merged.push(merge.await.unwrap().unwrap());
    }
    assert!(handle.is_locked());
    holder.await.unwrap();

    for update in merged {
        assert_eq!(update, isolated);
        let fresh = DocumentHandle::new().await.unwrap();
        fresh.apply_updates(&[base.clone(), update]).await.unwrap();
        assert_eq!(meta_of(&fresh).await, json!({"a": 1, "b": 2}));
    }
}
