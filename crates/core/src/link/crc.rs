//! Frame checksum
//!
//! CRC-8 with polynomial 0x31, MSB-first, seed 0xA5. Table-driven; the
//! table is built at compile time.

const POLY: u8 = 0x31;
const SEED: u8 = 0xA5;

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static TABLE: [u8; 256] = build_table();

pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = SEED;
    for &b in data {
        crc = TABLE[(crc ^ b) as usize];
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_polynomial() {
        // Spot checks against the 0x31 MSB-first table.
        assert_eq!(TABLE[0], 0x00);
        assert_eq!(TABLE[1], 0x31);
        assert_eq!(TABLE[2], 0x62);
    }

    #[test]
    fn checksum_depends_on_every_byte() {
        let base = [0u8; 9];
        let reference = crc8(&base);
        for i in 0..base.len() {
            let mut changed = base;
            changed[i] = 0x01;
            assert_ne!(crc8(&changed), reference, "byte {i} not covered");
        }
    }

    #[test]
    fn empty_input_yields_seed() {
        assert_eq!(crc8(&[]), SEED);
    }
}
