//! Challenge code generation.

use rand::rngs::OsRng;
use rand::Rng;

/// Generate a fixed-length numeric code from the OS random source.
///
/// The first digit is never zero, so the code is always exactly `len`
/// digits when displayed.
pub fn generate_code(len: usize) -> String {
    debug_assert!((1..=9).contains(&len));
    let low = 10u64.pow(len as u32 - 1);
    let high = 10u64.pow(len as u32);
    OsRng.gen_range(low..high).to_string()
}

/// Generate an opaque challenge reference (`ch_` + 16 hex chars).
pub fn generate_reference() -> String {
    let mut bytes = [0u8; 8];
    rand::RngCore::fill_bytes(&mut OsRng, &mut bytes);
    format!("ch_{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_requested_length() {
        for _ in 0..50 {
            let code = generate_code(6);
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn references_are_prefixed_and_distinct() {
        let a = generate_reference();
        let b = generate_reference();
        assert!(a.starts_with("ch_"));
        assert_eq!(a.len(), 19);
        assert_ne!(a, b);
    }
}
