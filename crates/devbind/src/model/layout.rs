// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire layout of packet payloads.
//!
//! Every frame starts with an 8-byte header; payload fields follow in
//! declaration order, each at the running sum of the previous sizes:
//!
//! ```text
//! 0        8         8+s0        8+s0+s1
//! | header | field 0 | field 1   | ...
//! ```
//!
//! Request building and response parsing in every backend read offsets from
//! the same [`Layout`], so the two sides cannot disagree.

use super::{Direction, Element, Packet};

/// Size of the frame header preceding every payload.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Payload budget of one frame (80-byte frame minus header).
pub const MAX_PAYLOAD_SIZE: usize = 64;

/// One element placed at its byte offset within the frame.
#[derive(Debug, Clone, Copy)]
pub struct FieldSlot<'a> {
    pub element: &'a Element,
    /// Offset from the start of the frame (header included).
    pub offset: usize,
    pub size: usize,
}

/// Placement of all elements of one direction.
#[derive(Debug, Clone)]
pub struct Layout<'a> {
    pub fields: Vec<FieldSlot<'a>>,
    pub payload_size: usize,
}

impl<'a> Layout<'a> {
    pub fn of(packet: &'a Packet, direction: Direction) -> Self {
        Self::from_elements(packet.elements(direction))
    }

    pub fn from_elements(elements: impl IntoIterator<Item = &'a Element>) -> Self {
        let mut offset = FRAME_HEADER_SIZE;
        let fields = elements
            .into_iter()
            .map(|element| {
                let size = element.wire_size();
                let slot = FieldSlot {
                    element,
                    offset,
                    size,
                };
                offset = offset.saturating_add(size);
                slot
            })
            .collect();

        Self {
            fields,
            payload_size: offset - FRAME_HEADER_SIZE,
        }
    }

    /// Total frame length including the header.
    pub fn frame_size(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload_size
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fits(&self) -> bool {
        self.payload_size <= MAX_PAYLOAD_SIZE
    }
}

/// Pack booleans LSB-first: item `i` lands in byte `i / 8`, bit `i % 8`.
pub fn pack_bools(values: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; values.len().div_ceil(8)];
    for (i, _) in values.iter().enumerate().filter(|(_, v)| **v) {
        bytes[i / 8] |= 1 << (i % 8);
    }
    bytes
}

/// Inverse of [`pack_bools`]. Missing bytes read as `false`.
pub fn unpack_bools(bytes: &[u8], count: usize) -> Vec<bool> {
    (0..count)
        .map(|i| bytes.get(i / 8).is_some_and(|b| b & (1 << (i % 8)) != 0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_bit_order() {
        assert_eq!(pack_bools(&[true]), vec![0x01]);
        assert_eq!(pack_bools(&[false, true]), vec![0x02]);
        assert_eq!(
            pack_bools(&[false, false, false, false, false, false, false, false, true]),
            vec![0x00, 0x01]
        );
    }

    #[test]
    fn test_pack_round_trip() {
        for len in [0usize, 1, 7, 8, 9, 64] {
            let values: Vec<bool> = (0..len).map(|i| i % 3 == 0 || i % 5 == 1).collect();
            let packed = pack_bools(&values);
            assert_eq!(packed.len(), len.div_ceil(8));
            assert_eq!(unpack_bools(&packed, len), values, "length {len}");
        }
    }

    #[test]
    fn test_unpack_short_input() {
        assert_eq!(unpack_bools(&[0xFF], 10)[8..], [false, false]);
    }
}
