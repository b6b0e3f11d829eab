/// Returns the shortest little-endian encoding of `k`, at least one byte long
pub fn prefix_key(k: u64) -> Vec<u8> {
    let bs = (8 - k.leading_zeros()/8) as usize;
    k.to_le_bytes()[..bs.max(1)].to_vec()
}

/// Inverse of [prefix_key]
pub fn from_prefix_key(k: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    let len = k.len().min(8);
    bytes[..len].copy_from_slice(&k[..len]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_key_test() {
        assert_eq!(prefix_key(0), vec![0]);
        assert_eq!(prefix_key(255), vec![255]);
        assert_eq!(prefix_key(256), vec![0, 1]);
        for k in [0, 1, 1000, u32::MAX as u64, u64::MAX] {
            assert_eq!(from_prefix_key(&prefix_key(k)), k);
        }
    }
}
