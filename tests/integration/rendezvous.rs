use crate::*;

use rendezvous_core::{Code, NodeFilter, NodeInfo, ServiceSource, TopicSource, TransportKind};

/// Node A publishes first, node B subscribes second: B gets A's source
/// without polling, over a connection the master opened.
#[tokio::test]
async fn test_publish_then_subscribe() {
    let t = TestMaster::start();

    let a = t
        .master
        .register_node(NodeInfo::new("", loopback(0)))
        .await
        .unwrap();
    assert_eq!(a.name.len(), 12);
    let source = TopicSource::new("cam/0", TransportKind::Tcp, loopback(47001));
    t.master.publish_topic(&a, source.clone()).await.unwrap();

    let mut b_inbox = inbox().await;
    let b = t
        .master
        .register_node(NodeInfo::new("", b_inbox.endpoint().clone()))
        .await
        .unwrap();
    t.master.subscribe_topic(&b, "cam/0").await.unwrap();

    assert_eq!(next_push(&mut b_inbox).await, Message::TopicSource(source));
}

/// Subscriber first: the publish triggers the push.
#[tokio::test]
async fn test_subscribe_then_publish() {
    let t = TestMaster::start();

    let mut b_inbox = inbox().await;
    let b = t
        .master
        .register_node(NodeInfo::new("", b_inbox.endpoint().clone()))
        .await
        .unwrap();
    t.master.subscribe_topic(&b, "cam/0").await.unwrap();
    assert_no_push(&mut b_inbox).await;

    let a = t
        .master
        .register_node(NodeInfo::new("", loopback(0)))
        .await
        .unwrap();
    let source = TopicSource::new("cam/0", TransportKind::Udp, Endpoint::new("239.10.20.30", 47002));
    t.master.publish_topic(&a, source.clone()).await.unwrap();

    assert_eq!(next_push(&mut b_inbox).await, Message::TopicSource(source));
}

/// Every subscriber hears about a new publisher.
#[tokio::test]
async fn test_publish_notifies_all_subscribers() {
    let t = TestMaster::start();

    let mut inboxes = Vec::new();
    for _ in 0..3 {
        let inbox = inbox().await;
        let node = t
            .master
            .register_node(NodeInfo::new("", inbox.endpoint().clone()))
            .await
            .unwrap();
        t.master.subscribe_topic(&node, "lidar").await.unwrap();
        inboxes.push(inbox);
    }

    let publisher = t
        .master
        .register_node(NodeInfo::new("", loopback(0)))
        .await
        .unwrap();
    let source = TopicSource::new("lidar", TransportKind::Tcp, loopback(47003));
    t.master.publish_topic(&publisher, source.clone()).await.unwrap();

    for inbox in &mut inboxes {
        assert_eq!(next_push(inbox).await, Message::TopicSource(source.clone()));
    }
}

#[tokio::test]
async fn test_duplicate_operations_are_rejected() {
    let t = TestMaster::start();
    let a = t.master.register_node(NodeInfo::new("", loopback(0))).await.unwrap();
    let b = t.master.register_node(NodeInfo::new("", loopback(0))).await.unwrap();
    let source = TopicSource::new("t", TransportKind::Tcp, loopback(47004));

    t.master.publish_topic(&a, source.clone()).await.unwrap();
    let same = t.master.publish_topic(&a, source.clone()).await.unwrap_err();
    let other = t.master.publish_topic(&b, source).await.unwrap_err();
    assert_eq!(same.code(), Code::AlreadyExists);
    assert_eq!(other.code(), Code::AlreadyExists);

    t.master.subscribe_topic(&b, "t").await.unwrap();
    assert_eq!(
        t.master.subscribe_topic(&b, "t").await.unwrap_err().code(),
        Code::AlreadyExists
    );
    assert_eq!(
        t.master.unsubscribe_topic(&a, "t").await.unwrap_err().code(),
        Code::NotFound
    );
}

#[tokio::test]
async fn test_unregister_round_trip() {
    let t = TestMaster::start();
    let before = t.master.get_nodes(&NodeFilter::All).await.len();

    let info = t.master.register_node(NodeInfo::new("", loopback(0))).await.unwrap();
    t.master.unregister_node(&info).await.unwrap();

    let after = t.master.get_nodes(&NodeFilter::All).await;
    assert_eq!(after.len(), before);
    assert!(after.iter().all(|n| n.name != info.name));
}

/// Watchers see topics appear and disappear, including when the publishing
/// node goes away.
#[tokio::test]
async fn test_watcher_sees_topic_lifecycle() {
    let t = TestMaster::start();

    let mut w_inbox = inbox().await;
    t.master
        .register_node(NodeInfo::watcher("", w_inbox.endpoint().clone()))
        .await
        .unwrap();

    let a = t.master.register_node(NodeInfo::new("", loopback(0))).await.unwrap();
    let first = TopicSource::new("imu", TransportKind::Tcp, loopback(47005));
    let second = TopicSource::new("gps", TransportKind::Tcp, loopback(47006));

    t.master.publish_topic(&a, first.clone()).await.unwrap();
    assert_eq!(next_push(&mut w_inbox).await, Message::TopicSource(first));

    t.master.unpublish_topic(&a, "imu").await.unwrap();
    assert_eq!(
        next_push(&mut w_inbox).await,
        Message::TopicClosed { topic: "imu".into() }
    );

    t.master.publish_topic(&a, second.clone()).await.unwrap();
    assert_eq!(next_push(&mut w_inbox).await, Message::TopicSource(second));

    t.master.unregister_node(&a).await.unwrap();
    assert_eq!(
        next_push(&mut w_inbox).await,
        Message::TopicClosed { topic: "gps".into() }
    );
}

/// A push to a node whose inbox is gone fails quietly; the registry keeps
/// serving requests.
#[tokio::test]
async fn test_failed_push_is_silent() {
    let t = TestMaster::start();

    let dead_inbox = inbox().await;
    let dead_endpoint = dead_inbox.endpoint().clone();
    drop(dead_inbox);

    let subscriber = t
        .master
        .register_node(NodeInfo::new("", dead_endpoint))
        .await
        .unwrap();
    t.master.subscribe_topic(&subscriber, "t").await.unwrap();

    let publisher = t.master.register_node(NodeInfo::new("", loopback(0))).await.unwrap();
    let source = TopicSource::new("t", TransportKind::Tcp, loopback(47007));
    t.master.publish_topic(&publisher, source.clone()).await.unwrap();

    let mut late = inbox().await;
    let late_node = t
        .master
        .register_node(NodeInfo::new("", late.endpoint().clone()))
        .await
        .unwrap();
    t.master.subscribe_topic(&late_node, "t").await.unwrap();
    assert_eq!(next_push(&mut late).await, Message::TopicSource(source));
}

#[tokio::test]
async fn test_service_rendezvous_both_orders() {
    let t = TestMaster::start();
    let add = ServiceSource::new("add", TransportKind::Tcp, loopback(47008));

    let mut early_inbox = inbox().await;
    let early = t
        .master
        .register_node(NodeInfo::new("", early_inbox.endpoint().clone()))
        .await
        .unwrap();
    t.master.register_service_client(&early, "add").await.unwrap();

    let server = t.master.register_node(NodeInfo::new("", loopback(0))).await.unwrap();
    t.master.register_service_server(&server, add.clone()).await.unwrap();
    assert_eq!(
        next_push(&mut early_inbox).await,
        Message::ServiceSource(add.clone())
    );

    let mut late_inbox = inbox().await;
    let late = t
        .master
        .register_node(NodeInfo::new("", late_inbox.endpoint().clone()))
        .await
        .unwrap();
    t.master.register_service_client(&late, "add").await.unwrap();
    assert_eq!(next_push(&mut late_inbox).await, Message::ServiceSource(add));
}
