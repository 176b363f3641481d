use rand::Rng;

/// Decides whether an outgoing packet is dropped instead of sent.
pub trait DropPolicy: 'static + Sync + Send {
    fn should_drop(&self, packet: &[u8]) -> bool;
}

#[derive(Default, Debug)]
pub struct NeverDrop;

impl DropPolicy for NeverDrop {
    #[inline]
    fn should_drop(&self, _packet: &[u8]) -> bool {
        false
    }
}

/// Drops a packet when a uniform draw from [0, 100) lands in
/// [0, percent]. Even a percent of 0 drops about one packet in a hundred.
#[derive(Debug, Clone, Copy)]
pub struct LossPercent {
    percent: u8,
}

impl LossPercent {
    pub fn new(percent: u8) -> Self {
        Self {
            percent: percent.min(100),
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    fn drops(&self, draw: u8) -> bool {
        draw <= self.percent
    }
}

impl DropPolicy for LossPercent {
    fn should_drop(&self, _packet: &[u8]) -> bool {
        let draw: u8 = rand::thread_rng().gen_range(0..100);
        self.drops(draw)
    }
}
