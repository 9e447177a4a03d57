//! Config block checksumming.
//!
//! Blocks carry a trailing CRC-64 (CRC-64/XZ) over every byte that
//! precedes the checksum field.

use crc::{Crc, CRC_64_XZ};

use silt_common::constants::{CONFIG_BLOCK_CRC_OFFSET, CONFIG_BLOCK_SIZE};

const CRC64_XZ: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

/// Computes the CRC-64/XZ of the given data.
#[inline]
pub fn crc64(data: &[u8]) -> u64 {
    CRC64_XZ.checksum(data)
}

/// Computes the checksum a config block image should carry.
///
/// The crc64 field is the trailing 8 bytes of the block, so hashing
/// everything before it is equivalent to hashing the image with the
/// field zeroed.
#[inline]
pub fn true_block_crc64(image: &[u8; CONFIG_BLOCK_SIZE]) -> u64 {
    crc64(&image[..CONFIG_BLOCK_CRC_OFFSET])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc64_deterministic() {
        let data = b"silt config block";
        assert_eq!(crc64(data), crc64(data));
        assert_ne!(crc64(data), crc64(b"silt config bloc!"));
        assert_ne!(crc64(data), 0);
    }

    #[test]
    fn test_block_crc_ignores_crc_field() {
        let mut image = [0u8; CONFIG_BLOCK_SIZE];
        image[100] = 0xAA;

        let before = true_block_crc64(&image);

        // Mutating the checksum field does not change the true checksum.
        image[CONFIG_BLOCK_CRC_OFFSET..].copy_from_slice(&u64::MAX.to_le_bytes());
        assert_eq!(true_block_crc64(&image), before);

        // Mutating covered bytes does.
        image[100] = 0xAB;
        assert_ne!(true_block_crc64(&image), before);
    }
}
