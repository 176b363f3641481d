use crate::protocol::rip;
use crate::route::RoutingTable;

/// Size of the all-zero datagram sent while the table is empty. It is not a
/// valid RIP message (96 bytes of body is no whole number of records) and
/// every decoder drops it; it only tells neighbors that this router is alive.
pub const FILLER_LEN: usize = 100;

/// The datagrams to broadcast for one update round.
///
/// One response is built per valid route, leaving out every route learned
/// through that route's next hop (split horizon).
pub fn advertisements(table: &RoutingTable) -> Vec<Vec<u8>> {
    if table.is_empty() {
        return vec![vec![0; FILLER_LEN]];
    }

    table
        .entries()
        .iter()
        .filter(|entry| {
            if !entry.is_valid() {
                log::debug!("Invalid entry: {}", entry.network());
            }
            entry.is_valid()
        })
        .map(|entry| rip::encode(table.entries(), entry.next_hop()))
        .collect()
}
