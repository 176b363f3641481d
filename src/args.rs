use std::{fmt::Display, net::Ipv4Addr};

use thiserror::Error;

use crate::config::{LocalIdentity, RipConfig};

/// Command line of the daemon.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Args {
    /// Name of the lab router to seed the table for.
    pub name: String,
    /// Percentage of outgoing updates to drop.
    pub loss_percent: u8,
    /// Address of the interface RIP runs on.
    pub local_addr: Ipv4Addr,
    /// Use RFC timers instead of the short lab timers.
    pub production: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseArgsError {
    #[error("name is required (-n)")]
    MissingName,
    #[error("local address is required (-a)")]
    MissingAddr,
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("malformed loss probability {0:?}")]
    MalformedLossPercent(String),
    #[error("loss probability must be between 0 and 100 (-lp), got {0}")]
    LossPercentOutOfRange(u32),
    #[error("malformed IPv4 address {0:?}")]
    MalformedAddr(String),
    #[error("unknown option {0}")]
    UnknownOption(String),
}

impl Args {
    pub const USAGE: &'static str =
        "Usage: ripd -n <router name> -a <local IPv4 address> [-lp <loss percent>] [--production]";

    /// Parse options, not including the program name.
    pub fn try_parse<I>(args: I) -> Result<Args, ParseArgsError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut name = None;
        let mut loss_percent = 0;
        let mut local_addr = None;
        let mut production = false;

        let mut args = args.into_iter();
        while let Some(opt) = args.next() {
            match opt.as_str() {
                "-n" => name = Some(value_of(&opt, args.next())?),
                "-lp" => {
                    let raw = value_of(&opt, args.next())?;
                    let pct = raw
                        .parse::<u32>()
                        .map_err(|_| ParseArgsError::MalformedLossPercent(raw.clone()))?;
                    loss_percent = u8::try_from(pct)
                        .ok()
                        .filter(|p| *p <= 100)
                        .ok_or(ParseArgsError::LossPercentOutOfRange(pct))?;
                }
                "-a" => {
                    let raw = value_of(&opt, args.next())?;
                    let addr = raw
                        .parse::<Ipv4Addr>()
                        .map_err(|_| ParseArgsError::MalformedAddr(raw.clone()))?;
                    local_addr = Some(addr);
                }
                "--production" => production = true,
                _ => return Err(ParseArgsError::UnknownOption(opt)),
            }
        }

        Ok(Args {
            name: name.ok_or(ParseArgsError::MissingName)?,
            loss_percent,
            local_addr: local_addr.ok_or(ParseArgsError::MissingAddr)?,
            production,
        })
    }

    pub fn config(&self) -> RipConfig {
        let base = if self.production {
            RipConfig::production()
        } else {
            RipConfig::default()
        };
        RipConfig {
            loss_percent: self.loss_percent,
            ..base
        }
    }

    pub fn identity(&self) -> LocalIdentity {
        LocalIdentity::new(self.local_addr)
    }
}

fn value_of(opt: &str, value: Option<String>) -> Result<String, ParseArgsError> {
    value
        .filter(|v| !v.starts_with('-'))
        .ok_or_else(|| ParseArgsError::MissingValue(opt.to_string()))
}

impl TryFrom<std::env::Args> for Args {
    type Error = ParseArgsError;

    fn try_from(args: std::env::Args) -> Result<Self, Self::Error> {
        Args::try_parse(args.skip(1))
    }
}

impl Display for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Name: {}, loss probability: {}%, interface: {}",
            self.name, self.loss_percent, self.local_addr
        )
    }
}
