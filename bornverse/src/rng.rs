//! Named, independently seeded random-number streams.
//!
//! Every source of randomness in a trajectory draws from exactly one named
//! stream, so two runs that make the same draws from the same streams are
//! byte-identical regardless of what the other streams were used for.
//! Branch selection (`ctrl`), projections (`proj`), Haar unitaries
//! (`haar`), measurement outcomes (`born`) and random initial states
//! (`state_init`) never share draws.

use derive_more::Display;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The five stream names the simulator knows about.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum StreamName {
    /// Stochastic branch selection in circuits.
    #[display(fmt = "ctrl")]
    Ctrl,
    /// Reserved for projection choices.
    #[display(fmt = "proj")]
    Proj,
    /// Haar-random unitary sampling.
    #[display(fmt = "haar")]
    Haar,
    /// Born-rule measurement outcomes.
    #[display(fmt = "born")]
    Born,
    /// Random initial states.
    #[display(fmt = "state_init")]
    StateInit,
}

impl StreamName {
    pub const ALL: [StreamName; 5] = [
        StreamName::Ctrl,
        StreamName::Proj,
        StreamName::Haar,
        StreamName::Born,
        StreamName::StateInit,
    ];

    fn index(self) -> usize {
        match self {
            StreamName::Ctrl => 0,
            StreamName::Proj => 1,
            StreamName::Haar => 2,
            StreamName::Born => 3,
            StreamName::StateInit => 4,
        }
    }
}

impl std::str::FromStr for StreamName {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ctrl" => Ok(StreamName::Ctrl),
            "proj" => Ok(StreamName::Proj),
            "haar" => Ok(StreamName::Haar),
            "born" => Ok(StreamName::Born),
            "state_init" => Ok(StreamName::StateInit),
            other => Err(crate::error::invalid(format!("unknown RNG stream `{other}`"))),
        }
    }
}

/// A registry of one independent `StdRng` per stream name.
#[derive(Clone, Debug)]
pub struct RngRegistry {
    streams: [StdRng; 5],
}

/// Weyl increment used to derive per-stream sub-seeds from a master seed.
const STREAM_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

impl RngRegistry {
    /// Seed every stream deterministically from one master seed.
    ///
    /// Each stream gets its own sub-seed, so draws from one stream never
    /// shift another.
    #[must_use]
    pub fn seeded(master: u64) -> Self {
        let stream = |i: u64| StdRng::seed_from_u64(master.wrapping_add((i + 1).wrapping_mul(STREAM_SALT)));
        Self {
            streams: [stream(0), stream(1), stream(2), stream(3), stream(4)],
        }
    }

    /// Seed every stream from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            streams: [
                StdRng::from_entropy(),
                StdRng::from_entropy(),
                StdRng::from_entropy(),
                StdRng::from_entropy(),
                StdRng::from_entropy(),
            ],
        }
    }

    /// Replace one stream with a freshly seeded generator.
    pub fn reseed(&mut self, name: StreamName, seed: u64) {
        self.streams[name.index()] = StdRng::seed_from_u64(seed);
    }

    /// Mutable access to a named stream.
    pub fn stream_mut(&mut self, name: StreamName) -> &mut StdRng {
        &mut self.streams[name.index()]
    }

    /// Draw one uniform `f64` in `[0, 1)` from a named stream.
    pub fn uniform(&mut self, name: StreamName) -> f64 {
        self.stream_mut(name).gen()
    }
}

impl Default for RngRegistry {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_identical_streams() {
        let mut a = RngRegistry::seeded(42);
        let mut b = RngRegistry::seeded(42);
        for name in StreamName::ALL {
            for _ in 0..16 {
                assert_eq!(a.uniform(name), b.uniform(name));
            }
        }
    }

    #[test]
    fn streams_are_independent_of_each_other() {
        let mut interleaved = RngRegistry::seeded(7);
        let mut isolated = RngRegistry::seeded(7);

        // Spend draws on every other stream in one registry only.
        for _ in 0..100 {
            interleaved.uniform(StreamName::Haar);
            interleaved.uniform(StreamName::Ctrl);
            interleaved.uniform(StreamName::Proj);
        }
        let a = interleaved.uniform(StreamName::Born);
        let b = isolated.uniform(StreamName::Born);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_streams_differ() {
        let mut reg = RngRegistry::seeded(3);
        let a = reg.uniform(StreamName::Ctrl);
        let b = reg.uniform(StreamName::Born);
        assert_ne!(a, b);
    }

    #[test]
    fn reseed_restarts_a_single_stream() {
        let mut reg = RngRegistry::seeded(11);
        let first = reg.uniform(StreamName::Haar);
        reg.reseed(StreamName::Haar, 11);
        // A fresh per-stream seed is not the registry derivation of 11.
        let restarted = reg.uniform(StreamName::Haar);
        let mut direct = StdRng::seed_from_u64(11);
        let expected: f64 = direct.gen();
        assert_eq!(restarted, expected);
        let _ = first;
    }

    #[test]
    fn stream_names_round_trip_through_strings() {
        for name in StreamName::ALL {
            let parsed: StreamName = name.to_string().parse().unwrap();
            assert_eq!(parsed, name);
        }
        assert!("bogus".parse::<StreamName>().is_err());
    }
}
