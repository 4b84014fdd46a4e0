//! Pickup locations served by the simulated base.

use rand::distributions::{WeightedError, WeightedIndex};
use rand::Rng;
use rand_distr::Distribution;

/// A pickup town with its county and a relative call volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Town {
    pub city: &'static str,
    pub county: &'static str,
    pub weight: u32,
}

pub const STATE: &str = "ME";

pub const TOWNS: &[Town] = &[
    Town { city: "PORTLAND", county: "CUMBERLAND", weight: 68 },
    Town { city: "LEWISTON", county: "ANDROSCOGGIN", weight: 37 },
    Town { city: "BANGOR", county: "PENOBSCOT", weight: 32 },
    Town { city: "BIDDEFORD", county: "YORK", weight: 22 },
    Town { city: "AUGUSTA", county: "KENNEBEC", weight: 19 },
    Town { city: "PRESQUE ISLE", county: "AROOSTOOK", weight: 9 },
    Town { city: "CARIBOU", county: "AROOSTOOK", weight: 8 },
    Town { city: "BATH", county: "SAGADAHOC", weight: 8 },
    Town { city: "ELLSWORTH", county: "HANCOCK", weight: 8 },
    Town { city: "ROCKLAND", county: "KNOX", weight: 7 },
    Town { city: "SKOWHEGAN", county: "SOMERSET", weight: 8 },
    Town { city: "BELFAST", county: "WALDO", weight: 7 },
    Town { city: "FARMINGTON", county: "FRANKLIN", weight: 7 },
    Town { city: "RUMFORD", county: "OXFORD", weight: 6 },
    Town { city: "WISCASSET", county: "LINCOLN", weight: 4 },
    Town { city: "MACHIAS", county: "WASHINGTON", weight: 4 },
    Town { city: "DOVER-FOXCROFT", county: "PISCATAQUIS", weight: 3 },
];

/// Weighted sampler over [`TOWNS`].
#[derive(Debug, Clone)]
pub struct TownPicker {
    index: WeightedIndex<u32>,
}

impl TownPicker {
    pub fn new() -> Result<Self, WeightedError> {
        Ok(Self {
            index: WeightedIndex::new(TOWNS.iter().map(|t| t.weight))?,
        })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Town {
        TOWNS[self.index.sample(rng)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    #[test]
    fn test_every_county_is_covered() {
        let counties: BTreeSet<&str> = TOWNS.iter().map(|t| t.county).collect();
        assert_eq!(counties.len(), 16);
    }

    #[test]
    fn test_picker_favours_heavy_towns() {
        let picker = TownPicker::new().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let portland = (0..2_000)
            .filter(|_| picker.pick(&mut rng).city == "PORTLAND")
            .count();
        let machias = (0..2_000)
            .filter(|_| picker.pick(&mut rng).city == "MACHIAS")
            .count();
        assert!(portland > machias);
    }
}
