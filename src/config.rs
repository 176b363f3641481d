use std::net::Ipv4Addr;
use std::time::Duration;

use crate::route::Network;

pub const RIP_PORT: u16 = 520;
pub const RIP_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 9);

/// Timers and addressing for a RIP node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RipConfig {
    /// How often the table is aged and broadcast.
    pub update_interval: Duration,
    /// How long a route may go without a refresh before it is invalidated.
    pub expire_timeout: Duration,
    /// How long an invalidated route is kept before it is removed.
    pub garbage_timeout: Duration,
    /// Percentage of outgoing packets to drop, in [0, 100].
    pub loss_percent: u8,
    pub group: Ipv4Addr,
    pub port: u16,
}

impl RipConfig {
    /// The timers of RFC 2453.
    pub fn production() -> Self {
        Self {
            update_interval: Duration::from_secs(30),
            expire_timeout: Duration::from_secs(180),
            garbage_timeout: Duration::from_secs(120),
            ..Self::default()
        }
    }
}

/// Short timers, suited for watching a small lab network converge.
impl Default for RipConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(2),
            expire_timeout: Duration::from_secs(12),
            garbage_timeout: Duration::from_secs(16),
            loss_percent: 0,
            group: RIP_GROUP,
            port: RIP_PORT,
        }
    }
}

/// The address of this router's interface and the subnet it is attached to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LocalIdentity {
    pub addr: Ipv4Addr,
    pub subnet: Network,
}

impl LocalIdentity {
    /// An interface attached to the /24 containing `addr`.
    pub fn new(addr: Ipv4Addr) -> Self {
        Self {
            addr,
            subnet: Network::containing(addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles() {
        let test = RipConfig::default();
        assert_eq!(test.update_interval, Duration::from_secs(2));
        assert_eq!(test.expire_timeout, Duration::from_secs(12));
        assert_eq!(test.garbage_timeout, Duration::from_secs(16));

        let prod = RipConfig::production();
        assert_eq!(prod.update_interval, Duration::from_secs(30));
        assert_eq!(prod.expire_timeout, Duration::from_secs(180));
        assert_eq!(prod.garbage_timeout, Duration::from_secs(120));
        assert_eq!(prod.group, Ipv4Addr::new(224, 0, 0, 9));
        assert_eq!(prod.port, 520);
    }

    #[test]
    fn local_identity_is_a_slash_24() {
        let me = LocalIdentity::new(Ipv4Addr::new(129, 21, 30, 37));
        assert_eq!(me.subnet, "129.21.30.0/24".parse::<Network>().unwrap());
    }
}
