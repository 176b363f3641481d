mod advertise;
mod udp;

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;

pub use advertise::{advertisements, FILLER_LEN};
pub use udp::{BindError, UdpTransport};

/// Datagram transport a RIP node speaks through.
#[async_trait]
pub trait Transport: 'static + Send + Sync {
    /// Send one datagram to `dest`, typically the RIP multicast group.
    async fn send_to(&self, payload: &[u8], dest: SocketAddr) -> io::Result<()>;

    /// Wait for the next datagram and the address it came from.
    async fn recv_from(&self) -> io::Result<(Vec<u8>, SocketAddr)>;
}
