use crate::core::record::ImageRecord;

/// Both sides must reach this for a group to skip pairwise review.
pub const KEEP_ALL_MIN_SIDE: u32 = 2000;

/// True when every image in the group is large on both axes. Such groups are
/// resolved without comparison; an empty group is trivially "keep all".
pub fn is_keep_all(group: &[ImageRecord]) -> bool {
    group
        .iter()
        .all(|r| r.width >= KEEP_ALL_MIN_SIDE && r.height >= KEEP_ALL_MIN_SIDE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_all_requires_every_side() {
        let large = vec![
            ImageRecord::new(1, 4000, 3000, 5_000_000),
            ImageRecord::new(2, 2000, 2000, 100),
        ];
        assert!(is_keep_all(&large));

        let mut mixed = large.clone();
        mixed.push(ImageRecord::new(3, 2000, 1999, 9_000_000));
        assert!(!is_keep_all(&mixed));
    }
}
