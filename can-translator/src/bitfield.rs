//! Bit field extraction and embedding
//!
//! Operates on a 64-bit payload interpreted as 8 bytes in big-endian order.
//! Bit position 0 is the most significant bit of byte 0 and positions grow
//! left to right across the payload (Motorola / MSB-first numbering, as used
//! by CAN signal databases).
//!
//! ```text
//! byte:      0                 1
//! bit:   0 1 2 3 4 5 6 7 | 8 9 10 ...
//!        ^ MSB of payload
//! ```
//!
//! Every function here is pure. Callers guarantee `num_bits` in `1..=64` and
//! `start_bit + num_bits <= 64`; signal tables are validated against this when
//! they are loaded.

/// Number of bits in a frame payload
pub const PAYLOAD_BITS: usize = 64;

/// A run of `num_bits` ones in the least significant bits
pub fn bitmask(num_bits: usize) -> u64 {
    if num_bits >= PAYLOAD_BITS {
        u64::MAX
    } else {
        (1u64 << num_bits) - 1
    }
}

/// A run of `num_bits` ones at the top of a field `total_length` bits wide
pub fn reverse_bitmask_variable_length(num_bits: usize, total_length: usize) -> u64 {
    let shift = total_length.saturating_sub(num_bits) as u32;
    bitmask(num_bits).checked_shl(shift).unwrap_or(0)
}

/// A run of `num_bits` ones at the top of the 64-bit payload
pub fn reverse_bitmask(num_bits: usize) -> u64 {
    reverse_bitmask_variable_length(num_bits, PAYLOAD_BITS)
}

/// Index of the byte holding `start_bit`
pub fn starting_byte(start_bit: usize) -> usize {
    start_bit / 8
}

/// Index of the byte holding the last bit of the field
pub fn ending_byte(start_bit: usize, num_bits: usize) -> usize {
    (start_bit + num_bits - 1) / 8
}

/// Position just past the last bit of the field within its final byte
///
/// Returns a value in `1..=8`; a field ending exactly on a byte boundary
/// yields 8.
pub fn find_end_bit(start_bit: usize, num_bits: usize) -> usize {
    match (start_bit + num_bits) % 8 {
        0 => 8,
        end_bit => end_bit,
    }
}

/// Byte `byte_num` of the payload, byte 0 being the most significant
pub fn nth_byte(source: u64, byte_num: usize) -> u8 {
    debug_assert!(byte_num < PAYLOAD_BITS / 8);
    (source >> (PAYLOAD_BITS - 8 * (byte_num + 1))) as u8
}

/// Whether `value` can be represented in `num_bits` unsigned bits
pub fn fits(value: u64, num_bits: usize) -> bool {
    value & !bitmask(num_bits) == 0
}

/// Extract the raw value of a field
///
/// Only bytes `starting_byte(start_bit)..=ending_byte(start_bit, num_bits)`
/// are read.
pub fn get_field(data: u64, start_bit: usize, num_bits: usize) -> u64 {
    debug_assert!((1..=PAYLOAD_BITS).contains(&num_bits));
    debug_assert!(start_bit + num_bits <= PAYLOAD_BITS);

    let start_byte = starting_byte(start_bit);
    let end_byte = ending_byte(start_bit, num_bits);

    // The lowest byte index carries the most significant bits.
    let mut accumulator: u128 = 0;
    for byte_num in start_byte..=end_byte {
        accumulator = (accumulator << 8) | u128::from(nth_byte(data, byte_num));
    }

    accumulator >>= 8 - find_end_bit(start_bit, num_bits);
    (accumulator as u64) & bitmask(num_bits)
}

/// Embed `value` into a field of `data`, leaving all other bits untouched
///
/// The value is not range checked: bits above `num_bits` are dropped. Use
/// [`fits`] first when overflow must be detected.
pub fn set_field(data: &mut u64, value: u64, start_bit: usize, num_bits: usize) {
    debug_assert!((1..=PAYLOAD_BITS).contains(&num_bits));
    debug_assert!(start_bit + num_bits <= PAYLOAD_BITS);

    let shift = (PAYLOAD_BITS - start_bit - num_bits) as u32;
    let mask = bitmask(num_bits) << shift;
    *data &= !mask;
    *data |= (value & bitmask(num_bits)) << shift;
}
