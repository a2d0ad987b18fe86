//! Reflected binary (Gray) code conversions

/// Encode a binary value as Gray code
pub fn binary_to_gray(binary: u32) -> u32 {
    binary ^ (binary >> 1)
}

/// Decode a Gray-coded value back to binary by XOR-folding the high bits down
pub fn gray_to_binary(gray: u32) -> u32 {
    let mut num = gray;
    num ^= num >> 16;
    num ^= num >> 8;
    num ^= num >> 4;
    num ^= num >> 2;
    num ^= num >> 1;
    num
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_code_round_trip() {
        for i in 0..=4096u32 {
            assert_eq!(gray_to_binary(binary_to_gray(i)), i, "Failed for {}", i);
        }
        for &i in &[u32::MAX, u32::MAX - 1, 1 << 31, 0xDEAD_BEEF] {
            assert_eq!(gray_to_binary(binary_to_gray(i)), i);
        }
    }

    #[test]
    fn test_known_values() {
        assert_eq!(gray_to_binary(0), 0);
        // Consecutive codes differ in one bit
        assert_eq!(binary_to_gray(7), 0b0100);
        assert_eq!(binary_to_gray(8), 0b1100);
        assert_eq!(gray_to_binary(0b1100), 8);
    }
}
