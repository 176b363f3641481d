use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::UdpSocket;

use super::Transport;

const RECV_BUFFER: usize = 2048;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("failed to bind to port {port}: {source}")]
    Bind { port: u16, source: io::Error },
    #[error("failed to join group {group} on {interface}: {source}")]
    JoinGroup {
        group: Ipv4Addr,
        interface: Ipv4Addr,
        source: io::Error,
    },
}

/// A UDP socket joined to the RIP multicast group on one interface.
pub struct UdpTransport {
    sock: UdpSocket,
}

impl UdpTransport {
    pub async fn bind(interface: Ipv4Addr, group: Ipv4Addr, port: u16) -> Result<Self, BindError> {
        let sock = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
            .await
            .map_err(|source| BindError::Bind { port, source })?;

        sock.join_multicast_v4(group, interface)
            .map_err(|source| BindError::JoinGroup {
                group,
                interface,
                source,
            })?;

        log::info!("Joined {group} on {interface}, listening on port {port}");
        Ok(Self { sock })
    }

    /// Wrap an already configured socket.
    pub fn from_socket(sock: UdpSocket) -> Self {
        Self { sock }
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_to(&self, payload: &[u8], dest: SocketAddr) -> io::Result<()> {
        self.sock.send_to(payload, dest).await.map(|_| ())
    }

    async fn recv_from(&self) -> io::Result<(Vec<u8>, SocketAddr)> {
        let mut buf = [0; RECV_BUFFER];
        let (n, sender) = self.sock.recv_from(&mut buf).await?;
        Ok((buf[..n].to_vec(), sender))
    }
}
