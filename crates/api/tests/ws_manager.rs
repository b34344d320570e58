//! Unit tests for `WsManager`.
//!
//! These exercise the viewer group directly, without performing any HTTP
//! upgrades: join/leave semantics, the join snapshot ordering, broadcast
//! delivery, heartbeat pruning and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use parking_api::ws::WsManager;

#[tokio::test]
async fn join_and_leave_track_connection_count() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _rx1 = manager.add("conn-1".to_string()).await;
    let _rx2 = manager.add("conn-2".to_string()).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 1);

    // Unknown IDs are a no-op.
    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn broadcast_reaches_every_viewer_and_skips_closed_channels() {
    let manager = WsManager::new();

    let gone = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;
    let mut rx3 = manager.add("conn-3".to_string()).await;
    drop(gone);

    let delivered = manager.broadcast(Message::Text("hello".into())).await;
    assert_eq!(delivered, 2);

    for rx in [&mut rx2, &mut rx3] {
        let msg = rx.recv().await.expect("viewer should receive broadcast");
        assert!(matches!(&msg, Message::Text(t) if *t == "hello"));
    }
}

#[tokio::test]
async fn first_message_precedes_later_broadcasts() {
    let manager = WsManager::new();

    let mut early = manager.add("conn-1".to_string()).await;
    let mut rx = manager
        .add_with_first("conn-2".to_string(), Message::Text("snapshot".into()))
        .await;
    manager.broadcast(Message::Text("event".into())).await;

    let first = rx.recv().await.expect("joiner should receive snapshot");
    assert!(matches!(&first, Message::Text(t) if *t == "snapshot"));
    let second = rx.recv().await.expect("joiner should receive event");
    assert!(matches!(&second, Message::Text(t) if *t == "event"));

    // The snapshot went to the joiner only.
    let msg = early.recv().await.expect("conn-1 should receive event");
    assert!(matches!(&msg, Message::Text(t) if *t == "event"));
    assert!(early.try_recv().is_err());
}

#[tokio::test]
async fn duplicate_id_replaces_previous_connection() {
    let manager = WsManager::new();

    let _rx_old = manager.add("conn-1".to_string()).await;
    let mut rx_new = manager.add("conn-1".to_string()).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.broadcast(Message::Text("replaced".into())).await;
    let msg = rx_new.recv().await.expect("new rx should receive message");
    assert!(matches!(&msg, Message::Text(t) if *t == "replaced"));
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;

    manager.shutdown_all().await;
    assert_eq!(manager.connection_count().await, 0);

    for rx in [&mut rx1, &mut rx2] {
        let msg = rx.recv().await.expect("viewer should receive Close");
        assert!(
            matches!(msg, Message::Close(None)),
            "Expected Close(None), got: {msg:?}"
        );
    }

    assert!(
        rx1.recv().await.is_none(),
        "Channel should be closed after shutdown"
    );
}

#[tokio::test]
async fn ping_all_pings_live_viewers_and_prunes_dead_ones() {
    let manager = WsManager::new();
    let mut live = manager.add("conn-1".to_string()).await;
    let dead = manager.add("conn-2".to_string()).await;
    drop(dead);

    assert_eq!(manager.ping_all().await, 1);
    assert_eq!(manager.connection_count().await, 1);

    let msg = live.recv().await.expect("viewer should receive Ping");
    assert!(matches!(msg, Message::Ping(_)));
}

#[tokio::test]
async fn heartbeat_task_prunes_viewers_that_went_away() {
    let manager = Arc::new(WsManager::new());
    let _live = manager.add("conn-1".to_string()).await;
    drop(manager.add("conn-2".to_string()).await);

    let heartbeat = manager.spawn_heartbeat(Duration::from_millis(10));
    let mut remaining = manager.connection_count().await;
    for _ in 0..100 {
        if remaining == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        remaining = manager.connection_count().await;
    }
    heartbeat.abort();

    assert_eq!(remaining, 1);
}
