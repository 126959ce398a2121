use crate::core::record::ImageRecord;

/// A max-resolution candidate still wins when its file is within this share
/// of the heaviest file in the group.
pub const NEAR_MAX_SIZE: f64 = 0.9;

/// Picks the image that has both the largest width and the largest height of
/// the group and a file at or near the largest size. Returns `None` when no
/// image qualifies. If several do, the heaviest wins, then the lowest id.
pub fn select_winner(group: &[ImageRecord]) -> Option<ImageRecord> {
    let max_width = group.iter().map(|r| r.width).max()?;
    let max_height = group.iter().map(|r| r.height).max()?;
    let max_size = group.iter().map(|r| r.size_bytes).max()?;

    group
        .iter()
        .filter(|r| r.width == max_width && r.height == max_height)
        .filter(|r| {
            r.size_bytes == max_size || r.size_bytes as f64 > max_size as f64 * NEAR_MAX_SIZE
        })
        .min_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then(a.id.cmp(&b.id)))
        .copied()
}
