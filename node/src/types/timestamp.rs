use std::{
    fmt::{self, Display, Formatter},
    ops::{Add, AddAssign, Sub},
};

use datasize::DataSize;
use serde::{Deserialize, Serialize};

/// A point in simulation time, measured in ticks since the start of the run.
///
/// The simulator never consults a wall clock: every timestamp in blocks,
/// votes and the event log is a logical tick, so two runs with the same seed
/// and configuration produce byte-identical artifacts.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    DataSize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Returns the timestamp of the start of the run.
    pub const fn zero() -> Self {
        Timestamp(0)
    }

    /// Returns the number of ticks since the start of the run.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Timestamp {
    fn from(tick: u64) -> Self {
        Timestamp(tick)
    }
}

impl Add<u64> for Timestamp {
    type Output = Timestamp;

    fn add(self, ticks: u64) -> Timestamp {
        Timestamp(self.0 + ticks)
    }
}

impl AddAssign<u64> for Timestamp {
    fn add_assign(&mut self, ticks: u64) {
        self.0 += ticks;
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = u64;

    fn sub(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
