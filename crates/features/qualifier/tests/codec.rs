use pbuild_qualifier::codec::{MAX_ENCODABLE, decode_weight, encode, fold_qualifiers};
use proptest::prelude::*;

fn qualifier() -> impl Strategy<Value = String> {
    "[-0-9A-Za-z_]{0,12}"
}

proptest! {
    #[test]
    fn encoding_preserves_order(a in 0..=MAX_ENCODABLE, b in 0..=MAX_ENCODABLE) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assume!(low != high);
        prop_assert!(encode(high) > encode(low), "encode({high}) <= encode({low})");
    }

    #[test]
    fn encoding_preserves_order_between_neighbours(value in 0..MAX_ENCODABLE) {
        prop_assert!(encode(value + 1) > encode(value));
    }

    #[test]
    fn encoding_length_is_bounded(value in any::<u64>()) {
        let encoded = encode(value);
        prop_assert!((1..=8).contains(&encoded.len()));
        prop_assert!(encoded.chars().all(|c| decode_weight(c) > 0));
    }

    #[test]
    fn folding_is_deterministic(
        qualifiers in proptest::collection::vec(qualifier(), 0..8),
        digits in proptest::option::of(1_usize..16),
    ) {
        prop_assert_eq!(fold_qualifiers(&qualifiers, digits), fold_qualifiers(&qualifiers.clone(), digits));
    }
}

#[test]
fn zero_encodes_to_the_weight_one_character() {
    assert_eq!(encode(0), "-");
    assert_eq!(decode_weight('-'), 1);
}

#[test]
fn small_values_keep_order_across_length_boundaries() {
    let boundaries = [7_u64, 8, 63, 64, 511, 512, 32_767, 32_768, (1 << 27) - 1, 1 << 27];
    for pair in boundaries.windows(2) {
        assert!(encode(pair[1]) > encode(pair[0]), "{} vs {}", pair[1], pair[0]);
    }
}

#[test]
fn folding_depends_on_character_positions() {
    let forward = ["v1", "20240101"];
    let reversed = ["1v", "10104202"];
    assert_eq!(fold_qualifiers(&forward, None), fold_qualifiers(&forward, None));
    assert_ne!(fold_qualifiers(&forward, None), fold_qualifiers(&reversed, None));
}

#[test]
fn list_permutation_leaves_the_fold_unchanged_as_sums_are_per_position() {
    let forward = ["v1", "20240101", "beta"];
    let shuffled = ["beta", "v1", "20240101"];
    assert_eq!(fold_qualifiers(&forward, None), fold_qualifiers(&shuffled, None));
}
