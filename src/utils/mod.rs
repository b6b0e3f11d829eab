//! Small helpers shared by the node, algebra and cursor code

use core::fmt::{Debug, Formatter};

/// A set of byte values, one bit per possible byte
///
/// Every node keeps one of these to index its edges by first byte.  The rank of a byte in the mask is
/// the position of its edge in the node's sorted edge list.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteMask([u64; 4]);

impl ByteMask {
    pub const fn new() -> Self {
        Self([0; 4])
    }

    #[inline]
    fn locate(byte: u8) -> (usize, u64) {
        ((byte >> 6) as usize, 1u64 << (byte & 63))
    }

    #[inline]
    pub fn test_bit(&self, byte: u8) -> bool {
        let (word, bit) = Self::locate(byte);
        self.0[word] & bit != 0
    }

    #[inline]
    pub fn set_bit(&mut self, byte: u8) {
        let (word, bit) = Self::locate(byte);
        self.0[word] |= bit;
    }

    /// Number of bytes in the mask
    pub fn len(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; 4]
    }

    pub fn or(&self, other: &Self) -> Self {
        Self(core::array::from_fn(|i| self.0[i] | other.0[i]))
    }

    pub fn and(&self, other: &Self) -> Self {
        Self(core::array::from_fn(|i| self.0[i] & other.0[i]))
    }

    /// Number of bytes in the mask that are lower than `byte`
    pub fn index_of(&self, byte: u8) -> usize {
        let (word, bit) = Self::locate(byte);
        let below: usize = self.0[..word].iter().map(|w| w.count_ones() as usize).sum();
        below + (self.0[word] & (bit - 1)).count_ones() as usize
    }

    /// Returns the byte of rank `idx`, counting from the lowest
    pub fn nth(&self, idx: usize) -> Option<u8> {
        self.iter().nth(idx)
    }

    /// Returns the lowest byte in the mask above `byte`
    pub fn next_bit(&self, byte: u8) -> Option<u8> {
        let start = byte as usize + 1;
        let mut word = start >> 6;
        if word == 4 {
            return None;
        }
        let mut bits = self.0[word] & (!0u64 << (start & 63));
        loop {
            if bits != 0 {
                return Some((word * 64 + bits.trailing_zeros() as usize) as u8);
            }
            word += 1;
            if word == 4 {
                return None;
            }
            bits = self.0[word];
        }
    }

    /// Returns the highest byte in the mask below `byte`
    pub fn prev_bit(&self, byte: u8) -> Option<u8> {
        let last = (byte as usize).checked_sub(1)?;
        let mut word = last >> 6;
        let mut bits = self.0[word] & (!0u64 >> (63 - (last & 63)));
        loop {
            if bits != 0 {
                return Some((word * 64 + 63 - bits.leading_zeros() as usize) as u8);
            }
            if word == 0 {
                return None;
            }
            word -= 1;
            bits = self.0[word];
        }
    }

    /// Iterates the bytes in ascending order
    pub fn iter(&self) -> ByteMaskIter {
        ByteMaskIter { words: self.0, word: 0 }
    }
}

impl From<u8> for ByteMask {
    fn from(byte: u8) -> Self {
        let mut mask = Self::new();
        mask.set_bit(byte);
        mask
    }
}

impl FromIterator<u8> for ByteMask {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut mask = Self::new();
        iter.into_iter().for_each(|byte| mask.set_bit(byte));
        mask
    }
}

impl Debug for ByteMask {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Ascending iterator over the bytes of a [ByteMask]
pub struct ByteMaskIter {
    words: [u64; 4],
    word: usize,
}

impl Iterator for ByteMaskIter {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        while self.word < 4 {
            let bits = self.words[self.word];
            if bits != 0 {
                self.words[self.word] = bits & (bits - 1);
                return Some((self.word * 64 + bits.trailing_zeros() as usize) as u8);
            }
            self.word += 1;
        }
        None
    }
}

/// Length of the longest common prefix of `a` and `b`
#[inline]
pub fn find_prefix_overlap(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_test() {
        let mut mask = ByteMask::new();
        assert!(mask.is_empty());
        for byte in [b'C', b'a', b't', b'a'] {
            mask.set_bit(byte);
        }
        assert_eq!(mask.len(), 3);
        assert!(mask.test_bit(b't'));
        assert!(!mask.test_bit(b'n'));
        assert_eq!(format!("{mask:?}"), "{67, 97, 116}");
    }

    #[test]
    fn rank_and_nth_agree() {
        let mask: ByteMask = [0u8, 3, 63, 64, 65, 127, 128, 200, 255].into_iter().collect();
        for (rank, byte) in mask.iter().enumerate() {
            assert_eq!(mask.index_of(byte), rank);
            assert_eq!(mask.nth(rank), Some(byte));
        }
        assert_eq!(mask.nth(9), None);
        assert_eq!(ByteMask::new().nth(0), None);
    }

    #[test]
    fn neighbours() {
        let bytes = [0u8, 5, 63, 64, 190, 255];
        let mask: ByteMask = bytes.into_iter().collect();
        for pair in bytes.windows(2) {
            assert_eq!(mask.next_bit(pair[0]), Some(pair[1]));
            assert_eq!(mask.prev_bit(pair[1]), Some(pair[0]));
        }
        assert_eq!(mask.next_bit(255), None);
        assert_eq!(mask.prev_bit(0), None);
        assert_eq!(mask.next_bit(70), Some(190));
        assert_eq!(mask.prev_bit(62), Some(5));

        let sparse = ByteMask::from(128);
        assert_eq!(sparse.next_bit(0), Some(128));
        assert_eq!(sparse.prev_bit(255), Some(128));
        assert_eq!(sparse.next_bit(128), None);
        assert_eq!(sparse.prev_bit(128), None);
    }

    #[test]
    fn combining() {
        let a: ByteMask = [1u8, 2, 100].into_iter().collect();
        let b: ByteMask = [2u8, 100, 200].into_iter().collect();
        assert_eq!(a.or(&b).iter().collect::<Vec<_>>(), vec![1, 2, 100, 200]);
        assert_eq!(a.and(&b).iter().collect::<Vec<_>>(), vec![2, 100]);
    }

    #[test]
    fn prefix_overlap() {
        assert_eq!(find_prefix_overlap(b"12345", b"67890"), 0);
        assert_eq!(find_prefix_overlap(b"", b"123"), 0);
        assert_eq!(find_prefix_overlap(b"12345", b"12300"), 3);
        assert_eq!(find_prefix_overlap(b"123", b"123000"), 3);
    }
}
