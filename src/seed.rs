//! Seed routes for the routers of the lab network.

use std::net::Ipv4Addr;

use thiserror::Error;

use crate::route::{Network, Route};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("unknown router {0:?}, configured routers are: queeg, comet, rhea, glados")]
    UnknownRouter(String),
}

const QUEEG: Ipv4Addr = Ipv4Addr::new(129, 21, 30, 37);
const COMET: Ipv4Addr = Ipv4Addr::new(129, 21, 34, 80);
const RHEA: Ipv4Addr = Ipv4Addr::new(129, 21, 37, 49);
const GLADOS: Ipv4Addr = Ipv4Addr::new(129, 21, 22, 196);

/// Directly attached neighbors of the named router, each one hop away.
pub fn routes_for(router: &str) -> Result<Vec<Route>, SeedError> {
    let neighbors = match router {
        "queeg" => [COMET, GLADOS],
        "comet" => [QUEEG, RHEA],
        "rhea" => [COMET, GLADOS],
        "glados" => [RHEA, QUEEG],
        _ => return Err(SeedError::UnknownRouter(router.to_string())),
    };

    Ok(neighbors
        .iter()
        .map(|&addr| Route::new(Network::containing(addr), addr, 1))
        .collect())
}
