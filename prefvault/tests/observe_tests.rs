use prefvault::PreferenceStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn emits_current_value_immediately() {
    let dir = tempdir().unwrap();
    let store = PreferenceStore::open(dir.path()).await.unwrap();

    // Never-written key observes as false
    let mut watch = store.observe_boolean("notifications_enabled").await;
    assert_eq!(watch.next().await, Some(false));

    store.set_boolean("notifications_enabled", true).await.unwrap();
    let mut watch = store.observe_boolean("notifications_enabled").await;
    assert_eq!(watch.next().await, Some(true));
}

#[tokio::test]
async fn emits_on_every_subsequent_write() {
    let dir = tempdir().unwrap();
    let store = PreferenceStore::open(dir.path()).await.unwrap();

    store.set_boolean("notifications_enabled", true).await.unwrap();

    let mut watch = store.observe_boolean("notifications_enabled").await;
    assert_eq!(watch.next().await, Some(true));

    store.set_boolean("notifications_enabled", false).await.unwrap();
    assert_eq!(watch.next().await, Some(false));

    store.set_boolean("notifications_enabled", true).await.unwrap();
    assert_eq!(watch.next().await, Some(true));
}

#[tokio::test]
async fn rewriting_same_value_still_notifies() {
    let dir = tempdir().unwrap();
    let store = PreferenceStore::open(dir.path()).await.unwrap();

    store.set_boolean("flag", true).await.unwrap();
    let mut watch = store.observe_boolean("flag").await;
    assert_eq!(watch.next().await, Some(true));

    store.set_boolean("flag", true).await.unwrap();
    assert_eq!(watch.next().await, Some(true));
}

#[tokio::test]
async fn multiple_watchers_all_receive_writes() {
    let dir = tempdir().unwrap();
    let store = PreferenceStore::open(dir.path()).await.unwrap();

    let mut w1 = store.observe_boolean("flag").await;
    let mut w2 = store.observe_boolean("flag").await;
    assert_eq!(w1.next().await, Some(false));
    assert_eq!(w2.next().await, Some(false));

    store.set_boolean("flag", true).await.unwrap();
    assert_eq!(w1.next().await, Some(true));
    assert_eq!(w2.next().await, Some(true));
}

#[tokio::test]
async fn watch_is_restartable_after_writes() {
    let dir = tempdir().unwrap();
    let store = PreferenceStore::open(dir.path()).await.unwrap();

    let mut first = store.observe_boolean("flag").await;
    assert_eq!(first.next().await, Some(false));
    store.set_boolean("flag", true).await.unwrap();
    assert_eq!(first.next().await, Some(true));
    drop(first);

    // A fresh watch starts from the latest value, not the history
    let mut second = store.observe_boolean("flag").await;
    assert_eq!(second.next().await, Some(true));
}

#[tokio::test(flavor = "multi_thread")]
async fn observe_racing_with_write_still_sees_the_write() {
    let dir = tempdir().unwrap();
    let store = Arc::new(PreferenceStore::open(dir.path()).await.unwrap());

    // A write landing between the observer's snapshot read and its channel
    // registration must still reach the watch, either as the initial value
    // or as a subsequent emission — never silently disappear.
    for i in 0..50 {
        let key = format!("flag_{i}");

        let setter = {
            let store = Arc::clone(&store);
            let key = key.clone();
            tokio::spawn(async move {
                store.set_boolean(&key, true).await.unwrap();
            })
        };
        let mut watch = store.observe_boolean(&key).await;
        setter.await.unwrap();

        let saw_write = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match watch.next().await {
                    Some(true) => break true,
                    Some(false) => continue,
                    None => break false,
                }
            }
        })
        .await
        .expect("watch never observed the concurrent write");
        assert!(saw_write, "iteration {i}: write was lost");
    }
}

#[tokio::test]
async fn reobserving_after_all_watchers_drop_reads_durable_value() {
    let dir = tempdir().unwrap();
    let store = PreferenceStore::open(dir.path()).await.unwrap();

    let mut watch = store.observe_boolean("flag").await;
    assert_eq!(watch.next().await, Some(false));
    drop(watch);

    // Write with no live watchers, then observe again
    store.set_boolean("flag", true).await.unwrap();
    let mut reborn = store.observe_boolean("flag").await;
    assert_eq!(reborn.next().await, Some(true));
}

#[tokio::test]
async fn watch_ends_when_store_is_dropped() {
    let dir = tempdir().unwrap();
    let store = PreferenceStore::open(dir.path()).await.unwrap();

    let mut watch = store.observe_boolean("flag").await;
    assert_eq!(watch.next().await, Some(false));

    drop(store);
    assert_eq!(watch.next().await, None);
}

#[tokio::test]
async fn writes_to_other_keys_do_not_wake_watchers() {
    let dir = tempdir().unwrap();
    let store = PreferenceStore::open(dir.path()).await.unwrap();

    let mut watch = store.observe_boolean("a").await;
    assert_eq!(watch.next().await, Some(false));

    store.set_boolean("b", true).await.unwrap();
    store.set_boolean("a", true).await.unwrap();

    // Only the write to "a" is observed
    assert_eq!(watch.next().await, Some(true));
}
