use proptest::prelude::*;

use praman_types::{IdentityId, TaxId, Timestamp};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Timestamp elapsed_since: elapsed_since(now) = now - self (saturating).
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::new(base);
        let now = Timestamp::new(base + offset);
        prop_assert_eq!(t.elapsed_since(now), offset);
    }

    /// Timestamp elapsed_since saturates to 0 when now < self.
    #[test]
    fn timestamp_elapsed_since_saturates(
        base in 1u64..1_000_000,
        deficit in 1u64..1_000_000,
    ) {
        let later = Timestamp::new(base + deficit);
        let earlier = Timestamp::new(base);
        prop_assert_eq!(later.elapsed_since(earlier), 0);
    }

    /// Timestamp has_expired agrees with manual arithmetic.
    #[test]
    fn timestamp_has_expired_correct(
        start in 0u64..500_000,
        duration in 1u64..500_000,
        offset in 0u64..1_000_000,
    ) {
        let t = Timestamp::new(start);
        let now = Timestamp::new(start.saturating_add(offset));
        prop_assert_eq!(t.has_expired(duration, now), offset >= duration);
    }

    /// Timestamp abs_diff is symmetric.
    #[test]
    fn timestamp_abs_diff_symmetric(a in 0u64..1_000_000, b in 0u64..1_000_000) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta.abs_diff(tb), tb.abs_diff(ta));
        prop_assert_eq!(ta.abs_diff(tb), a.abs_diff(b));
    }

    /// Identity numbers parse iff 12 digits with a nonzero lead.
    #[test]
    fn identity_id_parse_matches_shape(s in "[0-9]{12}") {
        let parsed = IdentityId::parse(s.clone());
        prop_assert_eq!(parsed.is_ok(), !s.starts_with('0'));
        if let Ok(id) = parsed {
            prop_assert_eq!(id.as_str(), s.as_str());
        }
    }

    /// Well-formed tax identifiers always parse and round-trip.
    #[test]
    fn tax_id_round_trips(s in "[A-Z]{5}[0-9]{4}[A-Z]") {
        let id = TaxId::parse(s.clone()).unwrap();
        prop_assert_eq!(id.to_string(), s);
    }

    /// Anything of the wrong length never parses as a tax identifier.
    #[test]
    fn tax_id_rejects_wrong_length(s in "[A-Z0-9]{0,9}") {
        prop_assert!(TaxId::parse(s).is_err());
    }
}
