//! RIPv2 response messages.
//!
//! ```text
//!  0       1       2       3
//! +-------+-------+-------+-------+
//! |version|command|   reserved    |
//! +-------+-------+-------+-------+
//! |     AFI       |  route tag    |  \
//! |        network address        |   |
//! |          subnet mask          |   | 20 bytes, repeated
//! |           next hop            |   |
//! |            metric             |  /
//! +-------+-------+-------+-------+
//! ```

use std::net::Ipv4Addr;

use thiserror::Error;

use crate::route::{Network, Route};
use crate::Message;

pub const VERSION: u8 = 2;
pub const AFI_INET: u16 = 2;

const HEADER_LEN: usize = 4;
const RECORD_LEN: usize = 20;

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Command {
    Request,
    Response,
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        match command {
            Command::Request => 1,
            Command::Response => 2,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Command::Request),
            2 => Ok(Command::Response),
            _ => Err(ParseError::BadCommand(value)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("message of {0} bytes is shorter than the header")]
    TooShort(usize),
    #[error("unsupported version {0}")]
    BadVersion(u8),
    #[error("unknown command {0}")]
    BadCommand(u8),
    #[error("message of {0} bytes does not hold a whole number of records")]
    BadLength(usize),
}

/// One route record as it appears on the wire.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct Record {
    afi: u16,
    route_tag: u16,
    address: Ipv4Addr,
    mask: Ipv4Addr,
    next_hop: Ipv4Addr,
    metric: u32,
}

impl Record {
    pub fn from_route(route: &Route) -> Self {
        Self {
            afi: AFI_INET,
            route_tag: 0,
            address: route.network().address(),
            mask: route.network().mask(),
            next_hop: route.next_hop(),
            metric: route.metric(),
        }
    }

    pub fn next_hop(&self) -> Ipv4Addr {
        self.next_hop
    }

    pub fn metric(&self) -> u32 {
        self.metric
    }

    /// The route this record offers when received from `sender`, or `None`
    /// for records of another address family or with a metric outside
    /// [1, 16].
    ///
    /// The record's own next hop field is ignored: the route is always
    /// reached through the neighbor that sent it.
    pub fn into_candidate(self, sender: Ipv4Addr) -> Option<Route> {
        if self.afi != AFI_INET {
            return None;
        }
        if self.metric < 1 || self.metric > Route::max_metric() {
            return None;
        }
        let network = Network::new(self.address, self.mask);
        Some(Route::new(network, sender, self.metric))
    }

    fn read(bytes: &[u8; RECORD_LEN]) -> Self {
        let u16_at = |i: usize| u16::from_be_bytes([bytes[i], bytes[i + 1]]);
        let u32_at =
            |i: usize| u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

        Self {
            afi: u16_at(0),
            route_tag: u16_at(2),
            address: Ipv4Addr::from(u32_at(4)),
            mask: Ipv4Addr::from(u32_at(8)),
            next_hop: Ipv4Addr::from(u32_at(12)),
            metric: u32_at(16),
        }
    }

    fn write(&self, v: &mut Vec<u8>) {
        v.extend_from_slice(&self.afi.to_be_bytes());
        v.extend_from_slice(&self.route_tag.to_be_bytes());
        v.extend_from_slice(&self.address.octets());
        v.extend_from_slice(&self.mask.octets());
        v.extend_from_slice(&self.next_hop.octets());
        v.extend_from_slice(&self.metric.to_be_bytes());
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct RipMessage {
    command: Command,
    records: Vec<Record>,
}

impl RipMessage {
    pub fn response(records: Vec<Record>) -> Self {
        Self {
            command: Command::Response,
            records,
        }
    }

    /// A response carrying every valid route except those learned through
    /// `exclude_next_hop` (split horizon).
    pub fn from_routes_with_split_horizon(routes: &[Route], exclude_next_hop: Ipv4Addr) -> Self {
        let records = routes
            .iter()
            .filter(|r| r.is_valid() && r.next_hop() != exclude_next_hop)
            .map(Record::from_route)
            .collect();
        Self::response(records)
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

impl Message for RipMessage {
    type Error = ParseError;

    fn into_bytes(self) -> Vec<u8> {
        let mut v = Vec::with_capacity(HEADER_LEN + self.records.len() * RECORD_LEN);

        v.push(VERSION);
        v.push(self.command.into());
        v.extend_from_slice(&[0, 0]);

        for record in &self.records {
            record.write(&mut v);
        }

        v
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() < HEADER_LEN {
            return Err(ParseError::TooShort(bytes.len()));
        }
        if bytes[0] != VERSION {
            return Err(ParseError::BadVersion(bytes[0]));
        }
        let command = Command::try_from(bytes[1])?;

        let body = &bytes[HEADER_LEN..];
        if body.is_empty() || body.len() % RECORD_LEN != 0 {
            return Err(ParseError::BadLength(bytes.len()));
        }

        let records = body
            .chunks_exact(RECORD_LEN)
            .filter_map(|chunk| <&[u8; RECORD_LEN]>::try_from(chunk).ok())
            .map(Record::read)
            .collect();

        Ok(Self { command, records })
    }
}

/// Encode the valid routes of a table snapshot as a response, leaving out
/// routes whose next hop is `exclude_next_hop`.
pub fn encode(routes: &[Route], exclude_next_hop: Ipv4Addr) -> Vec<u8> {
    RipMessage::from_routes_with_split_horizon(routes, exclude_next_hop).into_bytes()
}

/// Decode a datagram received from `sender` into candidate routes. Anything
/// that is not a well-formed response yields no candidates.
pub fn decode(bytes: &[u8], sender: Ipv4Addr) -> Vec<Route> {
    let message = match RipMessage::try_from_bytes(bytes) {
        Ok(message) => message,
        Err(e) => {
            log::debug!("Dropping malformed RIP message from {sender}: {e}");
            return Vec::new();
        }
    };

    if message.command != Command::Response {
        log::debug!("Ignoring RIP {:?} from {sender}", message.command);
        return Vec::new();
    }

    message
        .records
        .into_iter()
        .filter_map(|record| record.into_candidate(sender))
        .collect()
}
