//! Aspect-ratio filter applied before any size comparison.
//!
//! The similarity pass sometimes pairs a photo with a tall strip cut from a
//! page scan, or pairs a landscape shot with a portrait crop of it. Both are
//! removed here so the dominance rules only ever compare like with like.

use crate::core::record::ImageRecord;

/// A record at least this tall...
pub const BANNER_MIN_HEIGHT: u32 = 2000;
/// ...and at least this many times taller than wide (integer ratio) is a banner.
pub const BANNER_MIN_RATIO: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeFiltered {
    pub kept: Vec<ImageRecord>,
    /// Ids of banner-shaped records, in group order.
    pub discarded: Vec<u64>,
}

pub fn is_banner(record: &ImageRecord) -> bool {
    record
        .height
        .checked_div(record.width)
        .is_some_and(|ratio| ratio >= BANNER_MIN_RATIO && record.height >= BANNER_MIN_HEIGHT)
}

/// Drops banners and every record whose orientation disagrees with the
/// group's reference record. The reference is the first record with both
/// dimensions set; records without dimensions are always dropped.
pub fn filter_shapes(group: &[ImageRecord]) -> ShapeFiltered {
    let Some(reference) = group.iter().find(|r| r.has_dimensions()) else {
        return ShapeFiltered::default();
    };
    let s1 = reference.orientation();

    let mut out = ShapeFiltered::default();
    for record in group.iter().filter(|r| r.has_dimensions()) {
        if is_banner(record) {
            log::debug!("Discarding banner-shaped image {}", record);
            out.discarded.push(record.id);
            continue;
        }
        if s1 * record.orientation() >= 0.0 {
            out.kept.push(*record);
        }
    }
    out
}
