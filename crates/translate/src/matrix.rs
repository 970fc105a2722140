//! Translation path matrix
//!
//! Dense `MAX_FORMAT x MAX_FORMAT` table mapping (source, destination) to
//! the first hop of the best known path, its cumulative cost, and its
//! sample-rate-change class. Rebuilt from the translator list by a
//! modified Floyd–Warshall relaxation in which rate-change quality
//! dominates strictly: a composite path is never admitted on cost alone.

use crate::format::{Format, MAX_FORMAT};
use crate::registry::TranslatorId;
use tracing::{debug, trace};

/// How one translation leg affects sample-rate quality.
///
/// Ordered from best to worst; the numeric values are chosen so that the
/// arithmetic sum of two legs' classes orders composite paths correctly
/// (any sum is worse than any of its parts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RateChange {
    /// lossless -> lossless, original sampling
    LosslessToLosslessSame = 400_000,
    /// lossless -> lossy, original sampling
    LosslessToLossySame = 600_000,
    /// lossless -> lossless, up sample
    LosslessToLosslessUp = 800_000,
    /// lossless -> lossy, up sample
    LosslessToLossyUp = 825_000,
    /// lossless -> lossless, down sample
    LosslessToLosslessDown = 850_000,
    /// lossless -> lossy, down sample
    LosslessToLossyDown = 875_000,
    /// lossless source, unknown destination rate
    LosslessUnknown = 885_000,
    /// lossy -> lossless, original sampling
    LossyToLosslessSame = 900_000,
    /// lossy -> lossy, original sampling
    LossyToLossySame = 915_000,
    /// lossy -> lossless, up sample
    LossyToLosslessUp = 930_000,
    /// lossy -> lossy, up sample
    LossyToLossyUp = 945_000,
    /// lossy -> lossless, down sample
    LossyToLosslessDown = 960_000,
    /// lossy -> lossy, down sample
    LossyToLossyDown = 975_000,
    /// lossy source, unknown destination rate
    LossyUnknown = 985_000,
}

impl RateChange {
    /// Numeric class value; sums of these order multi-leg paths.
    pub fn value(self) -> u32 {
        self as u32
    }
}

/// Classify a single translation leg by the losslessness of each side
/// and the direction of any sample-rate change.
pub fn rate_change_for(src: Format, dst: Format) -> RateChange {
    let src_ll = src.is_lossless();
    let dst_ll = dst.is_lossless();
    let src_rate = src.sample_rate();
    let dst_rate = dst.sample_rate();

    if src_rate == 0 || dst_rate == 0 {
        return if src_ll {
            RateChange::LosslessUnknown
        } else {
            RateChange::LossyUnknown
        };
    }

    use std::cmp::Ordering::*;
    match (src_ll, dst_ll, src_rate.cmp(&dst_rate)) {
        (true, true, Equal) => RateChange::LosslessToLosslessSame,
        (true, false, Equal) => RateChange::LosslessToLossySame,
        (true, true, Less) => RateChange::LosslessToLosslessUp,
        (true, false, Less) => RateChange::LosslessToLossyUp,
        (true, true, Greater) => RateChange::LosslessToLosslessDown,
        (true, false, Greater) => RateChange::LosslessToLossyDown,
        (false, true, Equal) => RateChange::LossyToLosslessSame,
        (false, false, Equal) => RateChange::LossyToLossySame,
        (false, true, Less) => RateChange::LossyToLosslessUp,
        (false, false, Less) => RateChange::LossyToLossyUp,
        (false, true, Greater) => RateChange::LossyToLosslessDown,
        (false, false, Greater) => RateChange::LossyToLossyDown,
    }
}

/// One matrix cell: the first hop towards the destination and the
/// aggregate properties of the whole path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathCell {
    /// First translator on the path; `None` means no known path.
    pub step: Option<TranslatorId>,
    /// Cumulative cost to the destination, in µs per second of output.
    pub cost: u32,
    /// True when the path has two or more legs.
    pub multistep: bool,
    /// Summed rate-change class of every leg.
    pub rate_change: u32,
}

/// A direct (single-leg) capability, as seen by the matrix build.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DirectLeg {
    pub id: TranslatorId,
    pub src: Format,
    pub dst: Format,
    pub cost: u32,
}

/// The dense path table. Indexed `[src][dst]`.
#[derive(Debug, Clone)]
pub struct TransMatrix {
    cells: Box<[PathCell]>,
}

impl TransMatrix {
    pub(crate) fn new() -> TransMatrix {
        TransMatrix {
            cells: vec![PathCell::default(); MAX_FORMAT * MAX_FORMAT].into_boxed_slice(),
        }
    }

    /// The cell for a (source, destination) pair of dense indices.
    pub fn cell(&self, src: usize, dst: usize) -> &PathCell {
        &self.cells[src * MAX_FORMAT + dst]
    }

    fn cell_mut(&mut self, src: usize, dst: usize) -> &mut PathCell {
        &mut self.cells[src * MAX_FORMAT + dst]
    }

    /// Rebuild from the active direct legs, cheapest first within each
    /// (src, dst) group (the caller's list order).
    pub(crate) fn rebuild(&mut self, legs: impl Iterator<Item = DirectLeg>) {
        debug!("resetting translation matrix");
        self.cells.fill(PathCell::default());

        // Direct costs first. A leg displaces the incumbent when the cell
        // is empty, when it is cheaper at no worse a rate class, or when
        // its rate class is strictly better.
        for leg in legs {
            let rate_change = rate_change_for(leg.src, leg.dst).value();
            let cell = self.cell_mut(leg.src.index(), leg.dst.index());
            if cell.step.is_none()
                || (leg.cost < cell.cost && rate_change <= cell.rate_change)
                || rate_change < cell.rate_change
            {
                *cell = PathCell {
                    step: Some(leg.id),
                    cost: leg.cost,
                    multistep: false,
                    rate_change,
                };
            }
        }

        // Relax composite paths until stable. A composite x->y->z is never
        // admitted when the incumbent x->z already beats either of its
        // legs on rate class, and never on cost alone.
        loop {
            let mut changed = 0usize;
            for x in 0..MAX_FORMAT {
                for y in 0..MAX_FORMAT {
                    if x == y {
                        continue;
                    }
                    let Some(first_step) = self.cell(x, y).step else {
                        continue;
                    };
                    for z in 0..MAX_FORMAT {
                        if z == x || z == y {
                            continue;
                        }
                        if self.cell(y, z).step.is_none() {
                            continue;
                        }

                        let xy = *self.cell(x, y);
                        let yz = *self.cell(y, z);
                        let xz = *self.cell(x, z);

                        if xz.step.is_some()
                            && (xz.rate_change < xy.rate_change || xz.rate_change < yz.rate_change)
                        {
                            continue;
                        }

                        let new_rate_change = xy.rate_change + yz.rate_change;
                        let better = xz.step.is_none() || new_rate_change < xz.rate_change;
                        if !better {
                            continue;
                        }

                        let newcost = xy.cost.saturating_add(yz.cost);
                        *self.cell_mut(x, z) = PathCell {
                            step: Some(first_step),
                            cost: newcost,
                            multistep: true,
                            rate_change: new_rate_change,
                        };
                        trace!(
                            cost = newcost,
                            src = x,
                            dst = z,
                            via = y,
                            "discovered composite path"
                        );
                        changed += 1;
                    }
                }
            }
            if changed == 0 {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_values_are_the_documented_constants() {
        assert_eq!(RateChange::LosslessToLosslessSame.value(), 400_000);
        assert_eq!(RateChange::LosslessToLossySame.value(), 600_000);
        assert_eq!(RateChange::LosslessToLosslessUp.value(), 800_000);
        assert_eq!(RateChange::LosslessToLossyUp.value(), 825_000);
        assert_eq!(RateChange::LosslessToLosslessDown.value(), 850_000);
        assert_eq!(RateChange::LosslessToLossyDown.value(), 875_000);
        assert_eq!(RateChange::LosslessUnknown.value(), 885_000);
        assert_eq!(RateChange::LossyToLosslessSame.value(), 900_000);
        assert_eq!(RateChange::LossyToLossySame.value(), 915_000);
        assert_eq!(RateChange::LossyToLosslessUp.value(), 930_000);
        assert_eq!(RateChange::LossyToLossyUp.value(), 945_000);
        assert_eq!(RateChange::LossyToLosslessDown.value(), 960_000);
        assert_eq!(RateChange::LossyToLossyDown.value(), 975_000);
        assert_eq!(RateChange::LossyUnknown.value(), 985_000);
    }

    #[test]
    fn single_leg_classification() {
        // slin -> slin16: lossless both sides, upsample
        assert_eq!(
            rate_change_for(Format::Slin, Format::Slin16),
            RateChange::LosslessToLosslessUp
        );
        // slin -> ulaw: lossless to lossy, same rate
        assert_eq!(
            rate_change_for(Format::Slin, Format::Ulaw),
            RateChange::LosslessToLossySame
        );
        // ulaw -> slin: lossy to lossless, same rate
        assert_eq!(
            rate_change_for(Format::Ulaw, Format::Slin),
            RateChange::LossyToLosslessSame
        );
        // g722 -> slin: lossy to lossless, downsample
        assert_eq!(
            rate_change_for(Format::G722, Format::Slin),
            RateChange::LossyToLosslessDown
        );
        // slin -> h264: destination has no rate
        assert_eq!(
            rate_change_for(Format::Slin, Format::H264),
            RateChange::LosslessUnknown
        );
        assert_eq!(
            rate_change_for(Format::Gsm, Format::H264),
            RateChange::LossyUnknown
        );
    }

    #[test]
    fn destination_losslessness_is_tested_consistently() {
        // A lossless wideband source headed to a lossy narrowband format
        // must classify against the destination, not the source.
        assert_eq!(
            rate_change_for(Format::Slin16, Format::Ulaw),
            RateChange::LosslessToLossyDown
        );
        assert_eq!(
            rate_change_for(Format::Slin16, Format::Slin),
            RateChange::LosslessToLosslessDown
        );
    }

    #[test]
    fn sum_of_legs_is_worse_than_either_leg() {
        let a = RateChange::LosslessToLosslessUp.value();
        let b = RateChange::LosslessToLosslessDown.value();
        assert!(a + b > a);
        assert!(a + b > b);
        assert!(a + b > RateChange::LossyUnknown.value());
    }
}
