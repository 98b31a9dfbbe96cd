//! Stable landmark ids of the face mesh (468 points) and hand tracker (21 points).

pub const NOSE_TIP: usize = 1;
pub const TOP_OF_HEAD: usize = 10;
pub const UPPER_LIP: usize = 13;
pub const LOWER_LIP: usize = 14;
pub const LEFT_CHEEK: usize = 119;
pub const LEFT_EYE_INNER: usize = 133;
pub const CHIN: usize = 152;
pub const LEFT_FACE: usize = 234;
pub const RIGHT_CHEEK: usize = 348;
pub const RIGHT_EYE_INNER: usize = 362;
pub const RIGHT_FACE: usize = 454;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_TIP: usize = 20;

/// Palm base and fingertips; their hull covers the visible hand.
pub const HAND_OUTLINE: [usize; 9] = [
    WRIST, THUMB_CMC, THUMB_TIP, INDEX_MCP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_MCP, PINKY_TIP,
];
