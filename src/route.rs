use core::fmt;
use std::{
    net::Ipv4Addr,
    str::FromStr,
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::utils;

/// An IPv4 destination prefix. The address is always stored masked, so two
/// networks are equal iff they describe the same prefix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Network {
    address: Ipv4Addr,
    mask: Ipv4Addr,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseNetworkError {
    #[error("missing '/<prefix length>' in {0:?}")]
    MissingPrefixLen(String),
    #[error("malformed address {0:?}")]
    MalformedAddress(String),
    #[error("malformed prefix length {0:?}")]
    MalformedPrefixLen(String),
    #[error("prefix length {0} is longer than 32")]
    PrefixTooLong(u8),
}

impl Network {
    pub fn new(address: Ipv4Addr, mask: Ipv4Addr) -> Self {
        let masked = u32::from(address) & u32::from(mask);
        Self {
            address: Ipv4Addr::from(masked),
            mask,
        }
    }

    pub fn with_prefix_len(address: Ipv4Addr, prefix_len: u8) -> Result<Self, ParseNetworkError> {
        if prefix_len > 32 {
            return Err(ParseNetworkError::PrefixTooLong(prefix_len));
        }
        let mask = match prefix_len {
            0 => 0,
            n => u32::MAX << (32 - u32::from(n)),
        };
        Ok(Self::new(address, Ipv4Addr::from(mask)))
    }

    /// The /24 an address is attached to.
    pub fn containing(address: Ipv4Addr) -> Self {
        Self::new(address, Ipv4Addr::new(255, 255, 255, 0))
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn mask(&self) -> Ipv4Addr {
        self.mask
    }

    /// `None` when the mask is not a run of leading ones, which only a
    /// record read off the wire can carry.
    pub fn prefix_len(&self) -> Option<u32> {
        let mask = u32::from(self.mask);
        let len = mask.leading_ones();
        (len + mask.trailing_zeros() == 32).then_some(len)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.prefix_len() {
            Some(len) => write!(f, "{}/{}", self.address, len),
            None => write!(f, "{}/{}", self.address, self.mask),
        }
    }
}

impl FromStr for Network {
    type Err = ParseNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s
            .split_once('/')
            .ok_or_else(|| ParseNetworkError::MissingPrefixLen(s.to_string()))?;

        let address = addr
            .parse::<Ipv4Addr>()
            .map_err(|_| ParseNetworkError::MalformedAddress(addr.to_string()))?;
        let prefix_len = len
            .parse::<u8>()
            .map_err(|_| ParseNetworkError::MalformedPrefixLen(len.to_string()))?;

        Network::with_prefix_len(address, prefix_len)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Route {
    network: Network,
    next_hop: Ipv4Addr,
    metric: u32,
    valid: bool,
    pub last_updated: Instant,
}

impl Route {
    pub fn new(network: Network, next_hop: Ipv4Addr, metric: u32) -> Self {
        Self::learned_at(network, next_hop, metric, utils::now())
    }

    pub fn learned_at(network: Network, next_hop: Ipv4Addr, metric: u32, now: Instant) -> Self {
        Self {
            network,
            next_hop,
            metric,
            valid: true,
            last_updated: now,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn next_hop(&self) -> Ipv4Addr {
        self.next_hop
    }

    pub fn metric(&self) -> u32 {
        self.metric
    }

    /// False while the route is waiting to be garbage collected.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_unreachable(&self) -> bool {
        self.metric >= Route::max_metric()
    }

    pub fn max_metric() -> u32 {
        16
    }

    fn refresh(&mut self, next_hop: Ipv4Addr, metric: u32, now: Instant) {
        log::info!(
            "Update routing entry: old: {}, new next hop: {}, new metric: {}",
            self,
            next_hop,
            metric
        );
        self.next_hop = next_hop;
        self.metric = metric;
        self.valid = true;
        self.last_updated = now;
    }

    fn invalidate(&mut self, now: Instant) {
        self.valid = false;
        self.metric = Route::max_metric();
        self.last_updated = now;
    }

    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_updated)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.network, self.next_hop, self.metric, self.valid
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Ignored,
    Refreshed,
    Inserted,
}

/// Best known route per destination network. Holds at most one route per
/// network.
#[derive(Default, Debug)]
pub struct RoutingTable {
    entries: Vec<Route>,
}

impl RoutingTable {
    pub fn with_entries(entries: Vec<Route>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            table.add_entry(entry);
        }
        table
    }

    pub fn has_entry_for(&self, network: Network) -> bool {
        self.entries.iter().any(|e| e.network == network)
    }

    pub fn find_entry_for(&self, network: Network) -> Option<&Route> {
        self.entries.iter().find(|e| e.network == network)
    }

    fn find_mut_entry_for(&mut self, network: Network) -> Option<&mut Route> {
        self.entries.iter_mut().find(|e| e.network == network)
    }

    /// Seed a route, replacing any route already held for its network.
    pub fn add_entry(&mut self, entry: Route) {
        match self.find_mut_entry_for(entry.network) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[Route] {
        self.entries.as_slice()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply the distance-vector acceptance rule to a route advertised by a
    /// neighbor. `candidate.metric()` is the metric as advertised; the stored
    /// metric is one hop further.
    pub fn update(
        &mut self,
        candidate: &Route,
        local_subnet: Network,
        now: Instant,
    ) -> UpdateOutcome {
        if candidate.network == local_subnet {
            return UpdateOutcome::Ignored;
        }

        let metric = (candidate.metric + 1).min(Route::max_metric());

        match self.find_mut_entry_for(candidate.network) {
            Some(found) => {
                // A same-or-worse offer from another neighbor must not reset
                // the timer of the current route.
                if candidate.next_hop == found.next_hop || metric < found.metric {
                    found.refresh(candidate.next_hop, metric, now);
                    UpdateOutcome::Refreshed
                } else {
                    UpdateOutcome::Ignored
                }
            }
            None => {
                let entry = Route::learned_at(candidate.network, candidate.next_hop, metric, now);
                log::info!("New routing entry: {}", entry);
                self.entries.push(entry);
                UpdateOutcome::Inserted
            }
        }
    }

    /// Invalidate routes not refreshed within `timeout`. Returns the networks
    /// that expired.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> Vec<Network> {
        let mut expired = Vec::new();
        for entry in self.entries.iter_mut() {
            if entry.valid && entry.age(now) > timeout {
                entry.invalidate(now);
                log::info!("Expiring entry: {}", entry.network);
                expired.push(entry.network);
            }
        }
        expired
    }

    /// Remove invalid routes whose grace period of `timeout` is over. Returns
    /// the networks that were dropped.
    pub fn collect_garbage(&mut self, now: Instant, timeout: Duration) -> Vec<Network> {
        let mut dropped = Vec::new();
        self.entries.retain(|e| {
            if !e.valid && e.age(now) >= timeout {
                log::info!("Dropping entry: {}", e.network);
                dropped.push(e.network);
                false
            } else {
                true
            }
        });
        dropped
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.entries
            .iter()
            .fold(Ok(()), |acc, entry| acc.and_then(|_| writeln!(f, "{}", entry)))
    }
}
