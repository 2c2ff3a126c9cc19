use crate::*;

use serde_json::json;

use rendezvous_channel::{Publisher, Subscriber};
use rendezvous_core::config::ChannelConfig;
use rendezvous_core::{NodeInfo, TransportKind};

/// Full path: the publisher registers its source, the subscriber learns it
/// from a push, connects directly, and receives data without the master.
#[tokio::test]
async fn test_subscriber_receives_data_after_rendezvous() {
    let t = TestMaster::start();
    let config = ChannelConfig::default();

    let mut publisher = Publisher::bind("telemetry", TransportKind::Tcp, &loopback(0), &config)
        .await
        .unwrap();
    let pub_node = t
        .master
        .register_node(NodeInfo::new("", loopback(0)))
        .await
        .unwrap();
    t.master
        .publish_topic(&pub_node, publisher.source())
        .await
        .unwrap();

    let mut sub_inbox = inbox().await;
    let sub_node = t
        .master
        .register_node(NodeInfo::new("", sub_inbox.endpoint().clone()))
        .await
        .unwrap();
    t.master.subscribe_topic(&sub_node, "telemetry").await.unwrap();

    let source = match next_push(&mut sub_inbox).await {
        Message::TopicSource(source) => source,
        other => panic!("expected a topic source, got {other:?}"),
    };
    assert_eq!(source, publisher.source());

    let mut subscriber = Subscriber::connect(&source, &config).await.unwrap();
    tokio::time::timeout(
        PUSH_TIMEOUT,
        publisher.channel_mut().as_tcp_server().unwrap().accept(),
    )
    .await
    .unwrap()
    .unwrap();

    publisher.publish(json!({"speed": 3.5})).unwrap();
    assert_eq!(publisher.flush().await.unwrap(), 1);

    let payload = tokio::time::timeout(PUSH_TIMEOUT, subscriber.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payload, json!({"speed": 3.5}));
}

#[tokio::test]
async fn test_listed_topics_match_registered_sources() {
    let t = TestMaster::start();
    let config = ChannelConfig::default();

    let a = Publisher::bind("a", TransportKind::Tcp, &loopback(0), &config)
        .await
        .unwrap();
    let b = Publisher::bind("b", TransportKind::Tcp, &loopback(0), &config)
        .await
        .unwrap();
    let node = t
        .master
        .register_node(NodeInfo::new("", loopback(0)))
        .await
        .unwrap();
    t.master.publish_topic(&node, a.source()).await.unwrap();
    t.master.publish_topic(&node, b.source()).await.unwrap();

    let mut listed = t
        .master
        .list_topics(&rendezvous_core::TopicFilter::All)
        .await;
    listed.sort_by(|x, y| x.topic.cmp(&y.topic));
    assert_eq!(listed, vec![a.source(), b.source()]);
}
