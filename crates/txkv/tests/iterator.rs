//! Iterator behavior against the in-memory engine: transaction expiry,
//! reopening, the pull protocol, and shutdown.

use std::time::Duration;
use bytes::Bytes;
use txkv::{
    BatchOp, IteratorOptions, Key, KeyValueStore, OpenOptions, ReadOptions, Store, StoreError,
    StoreIterator, TypedArrayKind, Value, WriteOptions, mem::MemEngine,
};

async fn seeded(engine: &MemEngine, keys: &[&str]) -> Store<MemEngine> {
    let store = Store::open(engine.clone(), "iter", OpenOptions::default()).await.unwrap();
    let ops = keys.iter().map(|k| BatchOp::put(*k, *k)).collect();
    store.batch(ops, WriteOptions::default()).await.unwrap();
    store
}

fn text() -> IteratorOptions {
    IteratorOptions::new().key_as_buffer(false).value_as_buffer(false)
}

async fn next_key(iter: &StoreIterator) -> Option<String> {
    iter.next().await.unwrap().map(|(k, _)| k.as_text().unwrap().to_owned())
}

#[tokio::test]
async fn scan_delivers_each_pair_then_none() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b"]).await;

    let iter = store.iterator(text()).unwrap();
    assert_eq!(iter.next().await.unwrap(), Some((Key::from("a"), Value::from("a"))));
    assert_eq!(iter.next().await.unwrap(), Some((Key::from("b"), Value::from("b"))));
    assert_eq!(iter.next().await.unwrap(), None);
    assert_eq!(iter.next().await.unwrap(), None);
    assert_eq!(iter.cursors_opened(), 1);
}

#[tokio::test]
async fn forced_expiry_without_reopen_times_out() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b", "c"]).await;

    let iter = store.iterator(text()).unwrap();
    assert_eq!(next_key(&iter).await.as_deref(), Some("a"));
    engine.expire_transactions();
    assert_eq!(iter.next().await, Err(StoreError::CursorTimeout));
    // the error sticks
    assert_eq!(iter.next().await, Err(StoreError::CursorTimeout));
    assert_eq!(iter.cursors_opened(), 1);
}

#[tokio::test]
async fn forced_expiry_with_reopen_resumes() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b", "c"]).await;

    let iter = store.iterator(text().reopen_on_timeout(true)).unwrap();
    assert_eq!(next_key(&iter).await.as_deref(), Some("a"));
    engine.expire_transactions();
    assert_eq!(next_key(&iter).await.as_deref(), Some("b"));
    assert_eq!(next_key(&iter).await.as_deref(), Some("c"));
    assert_eq!(iter.cursors_opened(), 2);
    assert_eq!(next_key(&iter).await, None);
}

#[tokio::test]
async fn repeated_expiry_never_repeats_keys() {
    let engine = MemEngine::new();
    let keys: Vec<String> = (0..10).map(|i| format!("k{i:02}")).collect();
    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let store = seeded(&engine, &refs).await;

    for reverse in [false, true] {
        let iter = store.iterator(text().reopen_on_timeout(true).reverse(reverse)).unwrap();
        let mut seen = vec![];
        loop {
            engine.expire_transactions();
            let Some(key) = next_key(&iter).await else { break };
            seen.push(key);
        }
        let mut expected = keys.clone();
        if reverse {
            expected.reverse();
        }
        assert_eq!(seen, expected);
        assert!(iter.cursors_opened() > 1);
    }
}

#[tokio::test]
async fn reopen_respects_bounds_and_limit() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b", "c", "d", "e"]).await;

    let options = text().reopen_on_timeout(true).gt("a").lte("e").limit(3).reverse(true);
    let iter = store.iterator(options).unwrap();
    let mut seen = vec![];
    while let Some(key) = next_key(&iter).await {
        engine.expire_transactions();
        seen.push(key);
    }
    assert_eq!(seen, ["e", "d", "c"]);
}

#[tokio::test(start_paused = true)]
async fn idle_cursor_times_out() {
    let engine = MemEngine::new().with_idle_timeout(Duration::from_millis(50));
    let store = seeded(&engine, &["a", "b", "c"]).await;

    let iter = store.iterator(text()).unwrap();
    assert_eq!(next_key(&iter).await.as_deref(), Some("a"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(next_key(&iter).await.as_deref(), Some("b"));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(iter.next().await, Err(StoreError::CursorTimeout));

    let iter = store.iterator(text().reopen_on_timeout(true)).unwrap();
    assert_eq!(next_key(&iter).await.as_deref(), Some("a"));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(next_key(&iter).await.as_deref(), Some("b"));
    assert_eq!(next_key(&iter).await.as_deref(), Some("c"));
    assert_eq!(next_key(&iter).await, None);
    assert_eq!(iter.cursors_opened(), 2);
}

#[tokio::test]
async fn concurrent_pull_is_rejected() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b"]).await;

    let iter = store.iterator(text()).unwrap();
    let first = iter.next();
    assert!(matches!(iter.next().await, Err(StoreError::ProtocolViolation(_))));
    assert_eq!(first.await.unwrap().map(|(k, _)| k), Some(Key::from("a")));

    // once the first pull completes, pulling again is fine
    assert_eq!(next_key(&iter).await.as_deref(), Some("b"));
}

#[tokio::test]
async fn dropped_pull_releases_the_iterator() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b"]).await;

    let iter = store.iterator(text()).unwrap();
    drop(iter.next());
    assert_eq!(next_key(&iter).await.as_deref(), Some("a"));
}

#[tokio::test]
async fn end_stops_iteration() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b", "c"]).await;

    let iter = store.iterator(text()).unwrap();
    assert_eq!(next_key(&iter).await.as_deref(), Some("a"));
    iter.end().await.unwrap();
    assert_eq!(iter.next().await.unwrap(), None);
    assert_eq!(iter.next().await.unwrap(), None);
    iter.end().await.unwrap();
}

#[tokio::test]
async fn limits() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b", "c"]).await;

    let iter = store.iterator(text().limit(0)).unwrap();
    assert_eq!(iter.next().await.unwrap(), None);
    assert_eq!(iter.cursors_opened(), 0);

    let iter = store.iterator(text().limit(1)).unwrap();
    assert_eq!(next_key(&iter).await.as_deref(), Some("a"));
    // the limit is reached before the advance, so expiry cannot surface
    engine.expire_transactions();
    assert_eq!(iter.next().await.unwrap(), None);

    assert!(matches!(store.iterator(text().limit(-2)), Err(StoreError::ProtocolViolation(_))));
}

#[tokio::test]
async fn inverted_range_is_empty() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b", "x", "y"]).await;

    let iter = store.iterator(IteratorOptions::new().gte("x").lt("b")).unwrap();
    assert_eq!(iter.next().await.unwrap(), None);
}

#[tokio::test]
async fn cursor_reads_a_snapshot() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b", "c"]).await;

    let iter = store.iterator(text()).unwrap();
    assert_eq!(next_key(&iter).await.as_deref(), Some("a"));
    store.put("bb", "bb", WriteOptions::default()).await.unwrap();
    store.del("c", WriteOptions::default()).await.unwrap();
    assert_eq!(next_key(&iter).await.as_deref(), Some("b"));
    assert_eq!(next_key(&iter).await.as_deref(), Some("c"));
    assert_eq!(next_key(&iter).await, None);
}

#[tokio::test]
async fn entries_decode_as_bytes_by_default() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a"]).await;
    store.put("n", Value::Null, WriteOptions::default()).await.unwrap();

    let iter = store.iterator(IteratorOptions::new()).unwrap();
    assert_eq!(iter.next().await.unwrap(), Some((Key::from(b"a"), Value::from(b"a"))));
    assert_eq!(iter.next().await.unwrap(), Some((Key::from(b"n"), Value::from(Vec::<u8>::new()))));
}

#[tokio::test]
async fn aborted_fetch_fails_the_iterator() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b"]).await;

    engine.abort_next_fetch("connection lost");
    let iter = store.iterator(text()).unwrap();
    let aborted = StoreError::TransactionAbort("connection lost".to_owned());
    assert_eq!(iter.next().await, Err(aborted.clone()));
    assert_eq!(iter.next().await, Err(aborted.clone()));
    iter.end().await.unwrap();
    assert_eq!(iter.next().await, Err(aborted));
    assert_eq!(iter.cursors_opened(), 1);

    // the store and new iterators are unaffected
    assert_eq!(store.get("a", ReadOptions::native()).await.unwrap(), Value::from("a"));
    let iter = store.iterator(text()).unwrap();
    assert_eq!(next_key(&iter).await.as_deref(), Some("a"));
    assert_eq!(next_key(&iter).await.as_deref(), Some("b"));
    assert_eq!(next_key(&iter).await, None);
}

#[tokio::test]
async fn undecodable_value_fails_mid_scan() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "c"]).await;
    let typed = Value::Typed { kind: TypedArrayKind::Uint16, data: Bytes::from_static(&[1, 0]) };
    store.put("b", typed.clone(), WriteOptions::default()).await.unwrap();

    let iter = store.iterator(IteratorOptions::new()).unwrap();
    assert_eq!(iter.next().await.unwrap(), Some((Key::from(b"a"), Value::from(b"a"))));
    let coercion = StoreError::TypeCoercion("Uint16Array".to_owned());
    assert_eq!(iter.next().await, Err(coercion.clone()));
    assert_eq!(iter.next().await, Err(coercion));

    // the same entry reads back natively
    let iter = store.iterator(IteratorOptions::new().value_as_buffer(false)).unwrap();
    iter.next().await.unwrap();
    assert_eq!(iter.next().await.unwrap(), Some((Key::from(b"b"), typed)));
    store.put("d", "d", WriteOptions::default()).await.unwrap();
}

#[tokio::test]
async fn close_cancels_iterators() {
    let engine = MemEngine::new();
    let store = seeded(&engine, &["a", "b"]).await;

    let iter = store.iterator(text()).unwrap();
    assert_eq!(next_key(&iter).await.as_deref(), Some("a"));
    store.close().await.unwrap();
    assert_eq!(iter.next().await, Err(StoreError::Cancelled));
    iter.end().await.unwrap();
}
