//! Topic data plane: a publisher with a bounded outbox and the matching
//! subscriber.

use bytes::Bytes;

use rendezvous_core::config::ChannelConfig;
use rendezvous_core::{wire, Endpoint, FastPool, Message, Status, TopicSource, TransportKind};

use crate::channel::Channel;
use crate::message_channel::MessageChannel;

pub struct Publisher {
    topic: String,
    channel: Channel,
    outbox: FastPool<Bytes>,
    max_message_bytes: usize,
}

impl Publisher {
    /// Open the server role for `topic`. TCP listens on `endpoint`; UDP binds
    /// it and negotiates a multicast group.
    ///
    /// The returned [`Publisher::source`] is what gets registered with the
    /// master, so a TCP endpoint should name a reachable address, not the
    /// wildcard.
    pub async fn bind(
        topic: impl Into<String>,
        kind: TransportKind,
        endpoint: &Endpoint,
        config: &ChannelConfig,
    ) -> Result<Self, Status> {
        let topic = topic.into();
        let channel = Channel::serve(kind, endpoint, config).await?;
        tracing::info!(topic = %topic, kind = %kind, endpoint = %channel.endpoint(), "publisher bound");
        Ok(Self {
            topic,
            channel,
            outbox: FastPool::new(config.queue_size.max(1)),
            max_message_bytes: config.max_message_bytes,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn source(&self) -> TopicSource {
        TopicSource::new(
            self.topic.clone(),
            self.channel.kind(),
            self.channel.endpoint().clone(),
        )
    }

    pub fn channel_mut(&mut self) -> &mut Channel {
        &mut self.channel
    }

    /// Frames waiting in the outbox.
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Queue one payload. When the outbox is full the oldest frame is dropped.
    pub fn publish(&mut self, payload: serde_json::Value) -> Result<(), Status> {
        let message = Message::Data {
            topic: self.topic.clone(),
            payload,
        };
        let frame = wire::encode(&message, self.max_message_bytes)?;
        if self.outbox.push(Bytes::from(frame)).is_some() {
            tracing::debug!(topic = %self.topic, "outbox full, dropped oldest frame");
        }
        Ok(())
    }

    /// Write queued frames oldest first. Returns the number of frames sent.
    ///
    /// Stops at the first failed write. A frame that no subscriber received
    /// stays queued. Over TCP, a frame that reached some subscribers while
    /// others failed leaves the outbox, so the next flush does not repeat it
    /// to the healthy ones; the error is still returned.
    pub async fn flush(&mut self) -> Result<usize, Status> {
        let mut sent = 0;
        while let Some(frame) = self.outbox.front().cloned() {
            let (delivered, error) = match self.channel.as_tcp_server() {
                Some(server) => {
                    let out = server.fan_out(&frame).await;
                    (out.delivered > 0, out.error)
                }
                None => match self.channel.write(&frame).await {
                    Ok(()) => (true, None),
                    Err(e) => (false, Some(e)),
                },
            };
            if delivered {
                self.outbox.pop();
                sent += 1;
            }
            if let Some(e) = error {
                tracing::debug!(topic = %self.topic, sent, delivered, error = %e, "flush stopped");
                return Err(e);
            }
        }
        Ok(sent)
    }
}

pub struct Subscriber {
    topic: String,
    channel: MessageChannel,
}

impl Subscriber {
    /// Open the client role matching `source`.
    pub async fn connect(source: &TopicSource, config: &ChannelConfig) -> Result<Self, Status> {
        let channel = Channel::connect(source.kind, &source.endpoint).await?;
        tracing::info!(topic = %source.topic, endpoint = %source.endpoint, "subscriber connected");
        Ok(Self {
            topic: source.topic.clone(),
            channel: MessageChannel::new(channel, config.max_message_bytes),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next payload on this topic. Frames for other topics are skipped.
    pub async fn recv(&mut self) -> Result<serde_json::Value, Status> {
        loop {
            match self.channel.recv().await? {
                Message::Data { topic, payload } if topic == self.topic => return Ok(payload),
                other => {
                    tracing::debug!(topic = %self.topic, kind = other.kind(), "skipped frame");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(queue_size: usize) -> ChannelConfig {
        ChannelConfig {
            queue_size,
            ..ChannelConfig::default()
        }
    }

    #[tokio::test]
    async fn tcp_outbox_drops_oldest_then_flushes_in_order() {
        let config = config(2);
        let mut publisher =
            Publisher::bind("imu", TransportKind::Tcp, &Endpoint::new("127.0.0.1", 0), &config)
                .await
                .unwrap();
        let mut subscriber = Subscriber::connect(&publisher.source(), &config)
            .await
            .unwrap();
        publisher
            .channel_mut()
            .as_tcp_server()
            .unwrap()
            .accept()
            .await
            .unwrap();

        for i in 0..5 {
            publisher.publish(json!(i)).unwrap();
        }
        assert_eq!(publisher.pending(), 2);
        assert_eq!(publisher.flush().await.unwrap(), 2);
        assert_eq!(publisher.pending(), 0);

        assert_eq!(subscriber.recv().await.unwrap(), json!(3));
        assert_eq!(subscriber.recv().await.unwrap(), json!(4));
    }

    #[tokio::test]
    async fn partly_failed_flush_does_not_repeat_to_live_subscribers() {
        let config = config(4);
        let mut publisher =
            Publisher::bind("imu", TransportKind::Tcp, &Endpoint::new("127.0.0.1", 0), &config)
                .await
                .unwrap();
        let mut live = Subscriber::connect(&publisher.source(), &config)
            .await
            .unwrap();
        let gone = Subscriber::connect(&publisher.source(), &config)
            .await
            .unwrap();
        let server = publisher.channel_mut().as_tcp_server().unwrap();
        server.accept().await.unwrap();
        server.accept().await.unwrap();
        drop(gone);

        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok(payload) = live.recv().await {
                if seen_tx.send(payload).is_err() {
                    return;
                }
            }
        });

        // The reset on the closed socket surfaces after a few writes.
        let mut published = 0;
        let mut failed = false;
        for i in 0..50 {
            publisher
                .publish(json!({ "seq": i, "pad": "x".repeat(16 * 1024) }))
                .unwrap();
            published += 1;
            if publisher.flush().await.is_err() {
                failed = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(failed);
        assert_eq!(publisher.pending(), 0);
        assert_eq!(
            publisher.channel_mut().as_tcp_server().unwrap().accepted_count(),
            1
        );

        publisher.publish(json!({ "seq": "last" })).unwrap();
        assert_eq!(publisher.flush().await.unwrap(), 1);

        let mut seqs = Vec::new();
        loop {
            let payload = tokio::time::timeout(std::time::Duration::from_secs(5), seen_rx.recv())
                .await
                .unwrap()
                .unwrap();
            if payload["seq"] == json!("last") {
                break;
            }
            seqs.push(payload["seq"].as_i64().unwrap());
        }
        assert_eq!(seqs, (0..published).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn flush_without_subscribers_keeps_frames() {
        let config = config(4);
        let mut publisher =
            Publisher::bind("imu", TransportKind::Tcp, &Endpoint::new("127.0.0.1", 0), &config)
                .await
                .unwrap();
        publisher.publish(json!({"x": 1})).unwrap();
        assert!(publisher.flush().await.is_err());
        assert_eq!(publisher.pending(), 1);
    }
}
