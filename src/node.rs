use std::net::{IpAddr, Ipv6Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_util::sync::CancellationToken;

use crate::config::{LocalIdentity, RipConfig};
use crate::drop_policy::{DropPolicy, LossPercent};
use crate::net::{self, Transport};
use crate::protocol::rip;
use crate::route::{Network, Route, RoutingTable};
use crate::utils::{self, loop_with_interval};

/// Pause after a failed receive so a broken socket does not spin.
const RECV_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReceiveError {
    #[error("sender {0} is not an IPv4 address")]
    NonIpv4Sender(Ipv6Addr),
}

pub struct NodeBuilder {
    identity: LocalIdentity,
    config: RipConfig,
    seed: Vec<Route>,
    drop_policy: Option<Box<dyn DropPolicy>>,
}

impl NodeBuilder {
    pub fn new(identity: LocalIdentity) -> Self {
        Self {
            identity,
            config: RipConfig::default(),
            seed: Vec::new(),
            drop_policy: None,
        }
    }

    pub fn with_config(&mut self, config: RipConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Set the interval of sending periodic RIP updates.
    pub fn with_update_interval(&mut self, interval: Duration) -> &mut Self {
        self.config.update_interval = interval;
        self
    }

    /// Set how long a route can live without receiving an update.
    pub fn with_expire_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.expire_timeout = timeout;
        self
    }

    /// Set how long an expired route is kept before it is deleted.
    pub fn with_garbage_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.garbage_timeout = timeout;
        self
    }

    pub fn with_loss_percent(&mut self, percent: u8) -> &mut Self {
        self.config.loss_percent = percent;
        self
    }

    /// Replace the loss injection derived from the configured loss percent.
    pub fn with_drop_policy<DP: DropPolicy>(&mut self, policy: DP) -> &mut Self {
        self.drop_policy = Some(Box::new(policy));
        self
    }

    pub fn with_seed_routes(&mut self, routes: Vec<Route>) -> &mut Self {
        self.seed.extend(routes);
        self
    }

    pub fn build<T: Transport>(&mut self, transport: T) -> Node<T> {
        let drop_policy = self
            .drop_policy
            .take()
            .unwrap_or_else(|| Box::new(LossPercent::new(self.config.loss_percent)));

        let seed = std::mem::take(&mut self.seed);
        let routes = RoutingTable::with_entries(seed);

        Node {
            identity: self.identity,
            config: self.config.clone(),
            routes: Arc::new(RwLock::new(routes)),
            transport: Arc::new(transport),
            drop_policy,
        }
    }
}

/// A RIP speaker on a single interface.
///
/// The routing table is shared by the periodic updater and the receive loop;
/// every read or change of it happens under one lock acquisition.
pub struct Node<T: Transport> {
    identity: LocalIdentity,
    config: RipConfig,
    routes: Arc<RwLock<RoutingTable>>,
    transport: Arc<T>,
    drop_policy: Box<dyn DropPolicy>,
}

impl<T: Transport> Node<T> {
    pub fn identity(&self) -> LocalIdentity {
        self.identity
    }

    pub fn config(&self) -> &RipConfig {
        &self.config
    }

    pub async fn get_routing_table(&self) -> RwLockReadGuard<'_, RoutingTable> {
        self.routes.read().await
    }

    /// Run the periodic updater and the receive loop until `shutdown` is
    /// cancelled.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let updater = {
            let node = self.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { node.periodic_update(&shutdown).await })
        };

        self.receive_loop(&shutdown).await;

        if let Err(e) = updater.await {
            log::error!("Periodic updater failed: {e}");
        }
        log::info!("Node {} stopped", self.identity.addr);
    }

    async fn periodic_update(&self, shutdown: &CancellationToken) {
        loop_with_interval(self.config.update_interval, shutdown, || self.tick()).await;
    }

    /// One update round: age the table, then broadcast it.
    pub async fn tick(&self) {
        let packets = {
            let mut rt = self.routes.write().await;
            let now = utils::now();
            rt.expire(now, self.config.expire_timeout);
            rt.collect_garbage(now, self.config.garbage_timeout);
            log::debug!("Routing table:\n{}", *rt);
            net::advertisements(&rt)
        };

        let group = SocketAddr::V4(SocketAddrV4::new(self.config.group, self.config.port));
        for packet in packets {
            if self.drop_policy.should_drop(&packet) {
                log::debug!("Dropping outgoing update of {} bytes", packet.len());
                continue;
            }
            if let Err(e) = self.transport.send_to(&packet, group).await {
                log::warn!("Error while writing to group {group}: {e}");
            }
        }
    }

    async fn receive_loop(&self, shutdown: &CancellationToken) {
        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = self.transport.recv_from() => received,
            };

            match received {
                Ok((bytes, sender)) => {
                    if let Err(e) = self.handle_datagram(&bytes, sender).await {
                        log::warn!("Ignoring datagram: {e}");
                    }
                }
                Err(e) => {
                    log::warn!(
                        "Error while reading from transport: {e}, retrying in {:?}",
                        RECV_RETRY_DELAY
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(RECV_RETRY_DELAY) => {}
                    }
                }
            }
        }
    }

    /// Learn from a datagram received from `sender`.
    pub async fn handle_datagram(
        &self,
        bytes: &[u8],
        sender: SocketAddr,
    ) -> Result<(), ReceiveError> {
        let sender = match sender.ip() {
            IpAddr::V4(ip) => ip,
            IpAddr::V6(ip) => return Err(ReceiveError::NonIpv4Sender(ip)),
        };

        if sender == self.identity.addr {
            return Ok(());
        }
        log::debug!("Update received from: {sender}");

        let candidates = rip::decode(bytes, sender);
        let local_subnet = self.identity.subnet;

        let mut rt = self.routes.write().await;
        let now = utils::now();

        // Assume whoever speaks first is a direct neighbor.
        if rt.is_empty() {
            let neighbor = Network::containing(sender);
            if neighbor != local_subnet {
                log::info!("Bootstrapping from neighbor {neighbor} via {sender}");
                rt.add_entry(Route::learned_at(neighbor, sender, 1, now));
            }
        }

        for candidate in candidates.iter().filter(|c| c.network() != local_subnet) {
            rt.update(candidate, local_subnet, now);
        }

        Ok(())
    }
}
