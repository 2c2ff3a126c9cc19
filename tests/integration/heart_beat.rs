use crate::*;

use rendezvous_channel::HeartBeatSignaller;
use rendezvous_core::{ClientFilter, ClientInfo, NodeFilter, NodeInfo};

fn fast() -> NotifierConfig {
    NotifierConfig {
        heart_beat_interval: Duration::from_millis(50),
        heart_beat_trials: 3,
        ..NotifierConfig::default()
    }
}

async fn wait_until_gone(t: &TestMaster, client_id: u32) {
    let deadline = tokio::time::Instant::now() + PUSH_TIMEOUT;
    while t.master.has_client(client_id).await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "client {client_id} was never removed"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// A client whose heart beat stops is removed together with its nodes.
#[tokio::test]
async fn test_lost_heart_beat_removes_client_and_nodes() {
    let t = TestMaster::with_config(fast());

    let signaller = HeartBeatSignaller::start(&loopback(0), Duration::from_millis(20))
        .await
        .unwrap();
    let client = t
        .master
        .register_client(ClientInfo::new(Some(signaller.endpoint().clone())))
        .await
        .unwrap();
    signaller.set_client_id(client.id);

    let mut names = Vec::new();
    for _ in 0..2 {
        let node = t
            .master
            .register_node(NodeInfo::new("", loopback(0)).with_client(client.id))
            .await
            .unwrap();
        names.push(node.name);
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(t.master.has_client(client.id).await);
    assert_eq!(t.master.get_nodes(&NodeFilter::All).await.len(), 2);

    drop(signaller);
    wait_until_gone(&t, client.id).await;

    assert!(t.master.list_clients(&ClientFilter::All).await.is_empty());
    let remaining = t.master.get_nodes(&NodeFilter::All).await;
    assert!(remaining.iter().all(|n| !names.contains(&n.name)));
}

/// Clients registered without a heart-beat endpoint stay until unregistered.
#[tokio::test]
async fn test_client_without_heart_beat_persists() {
    let t = TestMaster::with_config(fast());
    let client = t
        .master
        .register_client(ClientInfo::new(None))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(t.master.has_client(client.id).await);

    t.master.unregister_client(client.id).await.unwrap();
    assert!(!t.master.has_client(client.id).await);
}

/// Topics of a dropped client close for watchers.
#[tokio::test]
async fn test_watchers_learn_when_client_topics_close() {
    let t = TestMaster::with_config(fast());

    let mut w_inbox = inbox().await;
    t.master
        .register_node(NodeInfo::watcher("", w_inbox.endpoint().clone()))
        .await
        .unwrap();

    let signaller = HeartBeatSignaller::start(&loopback(0), Duration::from_millis(20))
        .await
        .unwrap();
    let client = t
        .master
        .register_client(ClientInfo::new(Some(signaller.endpoint().clone())))
        .await
        .unwrap();
    signaller.set_client_id(client.id);
    let node = t
        .master
        .register_node(NodeInfo::new("", loopback(0)).with_client(client.id))
        .await
        .unwrap();
    let source = rendezvous_core::TopicSource::new(
        "odom",
        rendezvous_core::TransportKind::Tcp,
        loopback(47100),
    );
    t.master.publish_topic(&node, source.clone()).await.unwrap();
    assert_eq!(next_push(&mut w_inbox).await, Message::TopicSource(source));

    drop(signaller);
    assert_eq!(
        next_push(&mut w_inbox).await,
        Message::TopicClosed { topic: "odom".into() }
    );
    wait_until_gone(&t, client.id).await;
}
