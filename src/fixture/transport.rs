use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::net::Transport;

pub type Datagram = (Vec<u8>, SocketAddr);

/// In-memory transport. Whatever the node sends shows up on
/// `TransportHandle::sent`; whatever is pushed into
/// `TransportHandle::inject` is received by the node.
pub struct ChannelTransport {
    outbox: mpsc::UnboundedSender<Datagram>,
    inbox: Mutex<mpsc::UnboundedReceiver<Datagram>>,
    fail_sends: Arc<AtomicBool>,
}

pub struct TransportHandle {
    pub sent: mpsc::UnboundedReceiver<Datagram>,
    pub inject: mpsc::UnboundedSender<Datagram>,
    fail_sends: Arc<AtomicBool>,
}

impl TransportHandle {
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }

    /// Everything sent so far.
    pub fn drain_sent(&mut self) -> Vec<Datagram> {
        let mut sent = Vec::new();
        while let Ok(datagram) = self.sent.try_recv() {
            sent.push(datagram);
        }
        sent
    }
}

pub fn channel_transport() -> (ChannelTransport, TransportHandle) {
    let (outbox, sent) = mpsc::unbounded_channel();
    let (inject, inbox) = mpsc::unbounded_channel();
    let fail_sends = Arc::new(AtomicBool::new(false));

    let transport = ChannelTransport {
        outbox,
        inbox: Mutex::new(inbox),
        fail_sends: fail_sends.clone(),
    };
    let handle = TransportHandle {
        sent,
        inject,
        fail_sends,
    };
    (transport, handle)
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send_to(&self, payload: &[u8], dest: SocketAddr) -> io::Result<()> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected send failure"));
        }
        self.outbox
            .send((payload.to_vec(), dest))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "test handle dropped"))
    }

    async fn recv_from(&self) -> io::Result<Datagram> {
        match self.inbox.lock().await.recv().await {
            Some(datagram) => Ok(datagram),
            // Behave like an idle socket once the test stops injecting.
            None => std::future::pending().await,
        }
    }
}
