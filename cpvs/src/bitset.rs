//! Sparse Visibility Bitset
//!
//! Two bits per destination slot, four slots per byte, least significant bits first. Slot 0 is the reserved
//! room 0; room index `i` lives in slot `i + 1`. Visible slots are `0b11`, everything else is not visible.

/// Bit pattern of a visible slot.
const VISIBLE: u8 = 0b11;

/// Returns the size in bytes of a raw bitset covering `room_count` rooms plus the reserved slot.
///
/// * `room_count` - Number of rooms.
pub fn raw_bitset_len(room_count: usize) -> usize {
    (room_count + 4) / 4
}

/// Pack a set of visible room indices into a raw bitset. Indices `>= room_count` are ignored.
///
/// * `visible`    - Visible room indices (0-based).
/// * `room_count` - Number of rooms.
pub fn pack_visibility<I>(visible: I, room_count: usize) -> Vec<u8>
where
    I: IntoIterator<Item = usize>,
{
    let mut bytes = vec![0_u8; raw_bitset_len(room_count)];
    for room in visible.into_iter().filter(|&r| r < room_count) {
        let slot = room + 1;
        bytes[slot / 4] |= VISIBLE << ((slot % 4) * 2);
    }
    bytes
}

/// Unpack a raw bitset into one flag per slot. The result is truncated or zero-extended to `slot_count`.
///
/// * `bytes`      - The raw bitset.
/// * `slot_count` - Number of slots to return.
pub fn unpack_visibility(bytes: &[u8], slot_count: usize) -> Vec<bool> {
    let mut slots: Vec<bool> = bytes
        .iter()
        .flat_map(|&b| (0..4).map(move |j| (b >> (j * 2)) & VISIBLE == VISIBLE))
        .take(slot_count)
        .collect();
    slots.resize(slot_count, false);
    slots
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
