//! # CRC32 Implementation
//!
//! CRC-32 checksum used to seal Bluetooth output reports.
//!
//! **Algorithm**: CRC-32/ISO-HDLC (zlib), reflected polynomial 0xEDB88320
//!
//! The controller expects the checksum over a one byte seed followed by the
//! report body. Output reports use seed `0xA2`.

use crc::{Crc, CRC_32_ISO_HDLC};

/// Seed byte prepended when sealing output reports
pub const OUTPUT_SEED: u8 = 0xA2;

/// Seed byte for checking input reports.
///
/// Not validated against device captures; see [`verify_input_checksum`].
pub const INPUT_SEED: u8 = 0xA1;

/// zlib-compatible CRC-32
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Calculate the CRC32 of `seed` followed by `body`
///
/// # Arguments
///
/// * `seed` - Seed byte hashed before the body
/// * `body` - Report bytes (without the trailer)
///
/// # Returns
///
/// * `u32` - Calculated checksum
///
/// # Examples
///
/// ```
/// use dualsense_link::report::crc::crc32_seeded;
///
/// // Splitting the check string across seed and body gives the standard CRC-32
/// assert_eq!(crc32_seeded(b'1', b"23456789"), 0xCBF4_3926);
/// ```
pub fn crc32_seeded(seed: u8, body: &[u8]) -> u32 {
    let mut digest = CRC32.digest();
    digest.update(&[seed]);
    digest.update(body);
    digest.finalize()
}

/// Write the output checksum into the last four bytes of `report`
///
/// The checksum covers everything before the trailer and is stored
/// little-endian.
pub fn seal_output_report(report: &mut [u8]) {
    let len = report.len();
    if len < 4 {
        return;
    }
    let crc = crc32_seeded(OUTPUT_SEED, &report[..len - 4]);
    report[len - 4..].copy_from_slice(&crc.to_le_bytes());
}

/// Compare the trailer of a Bluetooth input report against [`INPUT_SEED`]
///
/// Diagnostic only. The input seed has not been confirmed against real
/// captures, so a `false` here must never be used to drop reports.
pub fn verify_input_checksum(report: &[u8]) -> bool {
    let len = report.len();
    if len < 4 {
        return false;
    }
    let mut trailer = [0u8; 4];
    trailer.copy_from_slice(&report[len - 4..]);
    u32::from_le_bytes(trailer) == crc32_seeded(INPUT_SEED, &report[..len - 4])
}
