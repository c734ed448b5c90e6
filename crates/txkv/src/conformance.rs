//! Conformance tests for [`KvEngine`] implementations.
//!
//! These tests drive an engine through a [`Store`] and check the behavior
//! every engine must share. To use these tests with a custom engine, call
//! [`conformance`] with your engine instance. Each test opens its own
//! location, so an engine can be reused across runs as long as it starts
//! empty.

use crate::{
    BatchOp, Entry, IteratorOptions, Key, KeyEncoding, KeyValueStore, KvEngine, OpenOptions,
    RangeCursor, ReadOptions, Store, StoreError, StoreResult, Value, WriteOptions, destroy,
};

/// Run all conformance tests against an engine.
///
/// This is the main entry point for testing a custom engine implementation.
pub async fn conformance<E: KvEngine>(engine: &E) -> StoreResult<()> {
    test_missing_key(engine).await?;
    test_put_get_roundtrip(engine).await?;
    test_empty_value_is_found(engine).await?;
    test_delete(engine).await?;
    test_batch(engine).await?;
    test_invalid_batch_is_atomic(engine).await?;
    test_forward_and_reverse(engine).await?;
    test_range_bounds(engine).await?;
    test_limit(engine).await?;
    test_inverted_range(engine).await?;
    test_open_flags(engine).await?;
    test_destroy(engine).await?;
    test_binary_keys(engine).await?;
    Ok(())
}

/// Open a fresh store at `location` with default options.
pub async fn open_store<E: KvEngine>(engine: &E, location: &str) -> StoreResult<Store<E>> {
    destroy(engine, location).await?;
    Store::open(engine.clone(), location, OpenOptions::default()).await
}

/// Pull every remaining entry from an iterator.
pub async fn collect<I: RangeCursor>(iter: &I) -> StoreResult<Vec<Entry>> {
    let mut entries = vec![];
    while let Some(entry) = iter.next().await? {
        entries.push(entry);
    }
    Ok(entries)
}

/// Keys of `entries`, as text.
fn keys(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(|(k, _)| String::from_utf8_lossy(k.as_bytes()).into_owned()).collect()
}

/// Keys of every entry in a scan, as text.
async fn scan_keys<E: KvEngine>(
    store: &Store<E>,
    options: IteratorOptions,
) -> StoreResult<Vec<String>> {
    let iter = store.iterator(options)?;
    Ok(keys(&collect(&iter).await?))
}

/// Write `a` through `e`, each holding its own key as value.
async fn seed<E: KvEngine>(store: &Store<E>) -> StoreResult<()> {
    let ops = ["c", "a", "e", "b", "d"].iter().map(|k| BatchOp::put(*k, *k)).collect();
    store.batch(ops, WriteOptions::default()).await
}

/// Test that reading an unwritten key fails with `NotFound`.
pub async fn test_missing_key<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-missing").await?;
    assert_eq!(store.get("nope", ReadOptions::default()).await, Err(StoreError::NotFound));
    store.close().await
}

/// Test that a written value reads back, as bytes and natively.
pub async fn test_put_get_roundtrip<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-roundtrip").await?;
    store.put("k", "v", WriteOptions::default()).await?;
    assert_eq!(store.get("k", ReadOptions::default()).await?, Value::from(b"v"));
    assert_eq!(store.get("k", ReadOptions::native()).await?, Value::from("v"));

    store.put("bytes", &[0u8, 1, 2][..], WriteOptions::default()).await?;
    assert_eq!(store.get("bytes", ReadOptions::default()).await?, Value::from(&[0u8, 1, 2]));
    store.close().await
}

/// Test that an empty value is distinguishable from a missing key.
pub async fn test_empty_value_is_found<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-empty").await?;
    store.put("empty", "", WriteOptions::default()).await?;
    let value = store.get("empty", ReadOptions::default()).await?;
    assert_eq!(value.as_bytes(), Some(&[][..]));
    store.close().await
}

/// Test that deletes remove keys and tolerate absent keys.
pub async fn test_delete<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-delete").await?;
    store.del("absent", WriteOptions::default()).await?;
    store.put("k", "v", WriteOptions::default()).await?;
    store.del("k", WriteOptions::default()).await?;
    assert_eq!(store.get("k", ReadOptions::default()).await, Err(StoreError::NotFound));
    store.close().await
}

/// Test that a batch applies its operations in order.
pub async fn test_batch<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-batch").await?;
    store.batch(vec![], WriteOptions::default()).await?;
    store
        .batch(
            vec![
                BatchOp::put("a", "1"),
                BatchOp::put("b", "2"),
                BatchOp::del("a"),
                BatchOp::put("b", "3"),
            ],
            WriteOptions::new().sync(true),
        )
        .await?;
    assert_eq!(store.get("a", ReadOptions::default()).await, Err(StoreError::NotFound));
    assert_eq!(store.get("b", ReadOptions::native()).await?, Value::from("3"));
    store.close().await
}

/// Test that a batch with an invalid operation changes nothing.
pub async fn test_invalid_batch_is_atomic<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-atomic").await?;
    store.put("keep", "old", WriteOptions::default()).await?;
    let res = store
        .batch(
            vec![BatchOp::put("keep", "new"), BatchOp::put("", "x")],
            WriteOptions::default(),
        )
        .await;
    assert!(matches!(res, Err(StoreError::InvalidKey(_))));
    assert_eq!(store.get("keep", ReadOptions::native()).await?, Value::from("old"));
    store.close().await
}

/// Test iteration order in both directions, and the `a`, `b` scan.
pub async fn test_forward_and_reverse<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-order").await?;
    store.put("a", "a", WriteOptions::default()).await?;
    store.put("b", "b", WriteOptions::default()).await?;

    let iter = store.iterator(IteratorOptions::new())?;
    assert_eq!(iter.next().await?, Some((Key::from(b"a"), Value::from(b"a"))));
    assert_eq!(iter.next().await?, Some((Key::from(b"b"), Value::from(b"b"))));
    assert_eq!(iter.next().await?, None);
    assert_eq!(iter.next().await?, None);

    seed(&store).await?;
    let forward = collect(&store.iterator(IteratorOptions::new())?).await?;
    assert_eq!(keys(&forward), ["a", "b", "c", "d", "e"]);
    let reverse = collect(&store.iterator(IteratorOptions::new().reverse(true))?).await?;
    assert_eq!(keys(&reverse), ["e", "d", "c", "b", "a"]);
    store.close().await
}

/// Test inclusive and exclusive bounds.
pub async fn test_range_bounds<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-bounds").await?;
    seed(&store).await?;

    let scan = IteratorOptions::new;
    assert_eq!(scan_keys(&store, scan().gte("b").lte("d")).await?, ["b", "c", "d"]);
    assert_eq!(scan_keys(&store, scan().gt("b").lt("d")).await?, ["c"]);
    assert_eq!(scan_keys(&store, scan().gt("b").gte("a")).await?, ["c", "d", "e"]);
    assert_eq!(scan_keys(&store, scan().lt("c").reverse(true)).await?, ["b", "a"]);
    assert_eq!(scan_keys(&store, scan().gte("bb").lte("dd")).await?, ["c", "d"]);
    store.close().await
}

/// Test that limits cap the number of entries in both directions.
pub async fn test_limit<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-limit").await?;
    seed(&store).await?;

    let two = collect(&store.iterator(IteratorOptions::new().limit(2))?).await?;
    assert_eq!(keys(&two), ["a", "b"]);
    let reverse = collect(&store.iterator(IteratorOptions::new().limit(2).reverse(true))?).await?;
    assert_eq!(keys(&reverse), ["e", "d"]);
    let all = collect(&store.iterator(IteratorOptions::new().limit(-1))?).await?;
    assert_eq!(all.len(), 5);
    let none = collect(&store.iterator(IteratorOptions::new().limit(0))?).await?;
    assert!(none.is_empty());
    let more = collect(&store.iterator(IteratorOptions::new().limit(50))?).await?;
    assert_eq!(more.len(), 5);

    assert!(matches!(
        store.iterator(IteratorOptions::new().limit(-3)),
        Err(StoreError::ProtocolViolation(_))
    ));
    store.close().await
}

/// Test that a self-contradictory range yields nothing.
pub async fn test_inverted_range<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-inverted").await?;
    seed(&store).await?;
    let iter = store.iterator(IteratorOptions::new().gte("x").lt("b"))?;
    assert_eq!(iter.next().await?, None);
    assert_eq!(iter.cursors_opened(), 0);
    store.close().await
}

/// Test `create_if_missing` and `error_if_exists`.
pub async fn test_open_flags<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let location = "conformance-flags";
    destroy(engine, location).await?;

    let strict = OpenOptions::new().create_if_missing(false);
    assert!(matches!(
        Store::open(engine.clone(), location, strict.clone()).await,
        Err(StoreError::StoreMissing(_))
    ));

    Store::open(engine.clone(), location, OpenOptions::default()).await?.close().await?;
    Store::open(engine.clone(), location, strict).await?.close().await?;

    let exclusive = OpenOptions::new().error_if_exists(true);
    assert!(matches!(
        Store::open(engine.clone(), location, exclusive).await,
        Err(StoreError::AlreadyExists(_))
    ));
    Ok(())
}

/// Test that destroy removes the data and that a missing store can be
/// destroyed.
pub async fn test_destroy<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let store = open_store(engine, "conformance-destroy").await?;
    store.put("k", "v", WriteOptions::default()).await?;
    store.destroy().await?;
    destroy(engine, "conformance-destroy").await?;
    destroy(engine, "conformance-never-created").await?;

    let store = Store::open(engine.clone(), "conformance-destroy", OpenOptions::default()).await?;
    assert_eq!(store.get("k", ReadOptions::default()).await, Err(StoreError::NotFound));
    store.close().await
}

/// Test binary keys: round-trip and byte-wise ordering.
pub async fn test_binary_keys<E: KvEngine>(engine: &E) -> StoreResult<()> {
    let location = "conformance-binary";
    destroy(engine, location).await?;
    let options = OpenOptions::new().key_encoding(KeyEncoding::Binary);
    let store = Store::open(engine.clone(), location, options).await?;

    let raw: [&[u8]; 4] = [&[0x80], &[0x00, 0x01], &[0xff, 0xff], &[0x00]];
    for key in raw {
        store.put(key, key, WriteOptions::default()).await?;
    }
    assert_eq!(
        store.get(&[0xffu8, 0xff][..], ReadOptions::default()).await?,
        Value::from(&[0xffu8, 0xff])
    );

    let entries = collect(&store.iterator(IteratorOptions::new())?).await?;
    let mut expected: Vec<&[u8]> = raw.to_vec();
    expected.sort();
    let got: Vec<&[u8]> = entries.iter().map(|(k, _)| k.as_bytes()).collect();
    assert_eq!(got, expected);

    let options = IteratorOptions::new().gt(&[0x00u8][..]).lt(&[0xffu8][..]);
    let bounded = collect(&store.iterator(options)?).await?;
    let got: Vec<&[u8]> = bounded.iter().map(|(k, _)| k.as_bytes()).collect();
    assert_eq!(got, [&[0x00u8, 0x01][..], &[0x80][..]]);
    store.close().await
}
