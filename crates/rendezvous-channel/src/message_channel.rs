use rendezvous_core::wire::{self, FrameHeader, HEADER_LEN};
use rendezvous_core::{Message, Status, TransportKind};

use crate::channel::Channel;

/// A channel that carries framed [`Message`]s instead of raw bytes.
pub struct MessageChannel {
    channel: Channel,
    max_message_bytes: usize,
    datagram: Vec<u8>,
}

impl MessageChannel {
    pub fn new(channel: Channel, max_message_bytes: usize) -> Self {
        Self {
            channel,
            max_message_bytes,
            datagram: Vec::new(),
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut Channel {
        &mut self.channel
    }

    pub fn into_inner(self) -> Channel {
        self.channel
    }

    pub async fn send(&mut self, message: &Message) -> Result<(), Status> {
        let frame = wire::encode(message, self.max_message_bytes)?;
        self.channel.write(&frame).await
    }

    pub async fn recv(&mut self) -> Result<Message, Status> {
        match self.channel.kind() {
            TransportKind::Tcp => {
                let mut header = [0u8; HEADER_LEN];
                self.channel.read(&mut header).await?;
                let size = FrameHeader::parse(&header, self.max_message_bytes)?;
                let mut body = vec![0u8; size];
                self.channel.read(&mut body).await?;
                wire::decode_body(&body)
            }
            TransportKind::Udp => {
                if self.datagram.is_empty() {
                    self.datagram = vec![0u8; HEADER_LEN + self.max_message_bytes];
                }
                let n = self.channel.read(&mut self.datagram).await?;
                wire::decode_frame(&self.datagram[..n], self.max_message_bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcp_client::TcpClientChannel;
    use crate::tcp_server::TcpServerChannel;
    use rendezvous_core::wire::DEFAULT_MAX_MESSAGE_BYTES;
    use rendezvous_core::{Code, Endpoint};
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn tcp_message_exchange() {
        let mut server = TcpServerChannel::listen(&Endpoint::new("127.0.0.1", 0))
            .await
            .unwrap();
        let client = TcpClientChannel::connect(server.endpoint()).await.unwrap();
        server.accept().await.unwrap();

        let mut tx = MessageChannel::new(server.into(), DEFAULT_MAX_MESSAGE_BYTES);
        let mut rx = MessageChannel::new(client.into(), DEFAULT_MAX_MESSAGE_BYTES);

        tx.send(&Message::HeartBeat { client_id: 3 }).await.unwrap();
        tx.send(&Message::TopicClosed { topic: "x".into() }).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Message::HeartBeat { client_id: 3 });
        assert_eq!(
            rx.recv().await.unwrap(),
            Message::TopicClosed { topic: "x".into() }
        );
    }

    #[tokio::test]
    async fn corrupt_header_is_data_loss() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = Endpoint::from(listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(&[0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 0]).await.unwrap();
        });

        let client = TcpClientChannel::connect(&endpoint).await.unwrap();
        let mut rx = MessageChannel::new(client.into(), DEFAULT_MAX_MESSAGE_BYTES);
        assert_eq!(rx.recv().await.unwrap_err().code(), Code::DataLoss);
    }
}
