//! Pairwise elimination of images that are worse than another image of the
//! same group. Resolution and file size stand in for quality: a bigger
//! picture, or a heavier file at about the same size, is assumed better.

use crate::core::record::ImageRecord;
use std::cmp::Ordering;

/// Area ratio under which the smaller image loses outright (rule 2).
pub const MUCH_SMALLER_AREA: f64 = 0.8;
/// Files above this size count as substantial for rule 2.
pub const SUBSTANTIAL_SIZE: u64 = 100_000;
/// Files above this size count as substantial for rule 5.
pub const LARGE_FILE_SIZE: u64 = 200_000;
/// Sides at or under this make an image small-format (rule 6).
pub const SMALL_FORMAT_SIDE: u32 = 1000;
/// Areas above this make an image large-format (rule 6).
pub const LARGE_FORMAT_AREA: u64 = 1_000_000;

/// The rule by which one image loses to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossRule {
    /// No larger on any of width, height and size.
    AllAxes,
    /// Under 80% of the other's area, and the other is a substantial file.
    MuchSmallerArea,
    /// The other is at least 90% of the area and 25% heavier.
    HeavierAtSimilarArea,
    /// The other is larger and at least half the bytes.
    LargerArea,
    /// The other is larger, at least 70% of the bytes and a large file.
    LargerAreaLargeFile,
    /// Small-format image against a large-format one of comparable weight.
    SmallFormat,
}

/// Returns the first rule under which `a` loses to `b`, if any.
pub fn loss_rule(a: &ImageRecord, b: &ImageRecord) -> Option<LossRule> {
    let (a_area, b_area) = (a.area() as f64, b.area() as f64);
    let (a_size, b_size) = (a.size_bytes as f64, b.size_bytes as f64);

    if a.width <= b.width && a.height <= b.height && a.size_bytes <= b.size_bytes {
        return Some(LossRule::AllAxes);
    }
    if a_area < b_area * MUCH_SMALLER_AREA && b.size_bytes > SUBSTANTIAL_SIZE {
        return Some(LossRule::MuchSmallerArea);
    }
    if b_area > a_area * 0.9 && b_size > a_size * 1.25 {
        return Some(LossRule::HeavierAtSimilarArea);
    }
    if b_area > a_area && b_size > a_size * 0.5 {
        return Some(LossRule::LargerArea);
    }
    // Rules 5 and 6 are implied by rule 4 and never fire on their own.
    if b_area > a_area && b_size > a_size * 0.7 && b.size_bytes > LARGE_FILE_SIZE {
        return Some(LossRule::LargerAreaLargeFile);
    }
    if a.width <= SMALL_FORMAT_SIDE
        && a.height <= SMALL_FORMAT_SIDE
        && b.area() > LARGE_FORMAT_AREA
        && b_size > a_size * 0.5
    {
        return Some(LossRule::SmallFormat);
    }
    None
}

/// Does `a` lose to `b`?
pub fn loses(a: &ImageRecord, b: &ImageRecord) -> bool {
    loss_rule(a, b).is_some()
}

/// Ordering used when two images each lose to the other: larger area, then
/// larger file, then lower id wins.
fn preference(a: &ImageRecord, b: &ImageRecord) -> Ordering {
    a.area()
        .cmp(&b.area())
        .then(a.size_bytes.cmp(&b.size_bytes))
        .then(b.id.cmp(&a.id))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pruned {
    /// Images nothing else in the group beats, in group order.
    pub survivors: Vec<ImageRecord>,
    /// Ids of eliminated images, in elimination order.
    pub discarded: Vec<u64>,
}

/// Compares every pair of still-alive images and eliminates the loser. An
/// eliminated image takes no further part on either side.
pub fn prune(group: &[ImageRecord]) -> Pruned {
    let mut alive = vec![true; group.len()];
    let mut discarded = Vec::new();

    for i in 0..group.len() {
        if !alive[i] {
            continue;
        }
        for j in (i + 1)..group.len() {
            if !alive[j] {
                continue;
            }
            let (a, b) = (&group[i], &group[j]);
            let loser = match (loss_rule(a, b), loss_rule(b, a)) {
                // Each loses to the other: keep the larger area, then the
                // larger file, then the lower id (see `preference`).
                (Some(_), Some(_)) => {
                    log::debug!("{} and {} lose to each other", a, b);
                    if preference(a, b) == Ordering::Greater {
                        j
                    } else {
                        i
                    }
                }
                (Some(rule), None) => {
                    log::debug!("{} loses to {} ({:?})", a, b, rule);
                    i
                }
                (None, Some(rule)) => {
                    log::debug!("{} loses to {} ({:?})", b, a, rule);
                    j
                }
                (None, None) => continue,
            };
            alive[loser] = false;
            discarded.push(group[loser].id);
            if loser == i {
                break;
            }
        }
    }

    let survivors = group
        .iter()
        .zip(&alive)
        .filter_map(|(record, &keep)| keep.then_some(*record))
        .collect();
    Pruned {
        survivors,
        discarded,
    }
}
