//! Order-preserving variable-length base-64 encoding and qualifier folding.
//!
//! The first character of an encoded number carries, in its upper three bits, the count of
//! characters that follow (0 to 7); its lower three bits and every following character hold
//! the value, most-significant group first:
//!
//! ```text
//!          0 --> 000 000                      --> "-"
//!          7 --> 000 111                      --> "6"
//!          8 --> 001 000 001000               --> "77"
//!         63 --> 001 000 111111               --> "7z"
//!         64 --> 001 001 000000               --> "8-"
//!        511 --> 001 111 111111               --> "Ez"
//!        512 --> 010 000 001000 000000        --> "F7-"
//!   2^45 - 1 --> 111 111 111111 ... 111111   --> "zzzzzzzz"
//! ```
//!
//! Because the alphabet is in ascending byte order, a larger number always encodes to a
//! byte-wise greater string.

/// The 64 characters legal in a qualifier, in ascending byte order.
pub const ALPHABET: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Largest value with a distinct encoding. Larger values saturate to it.
pub const MAX_ENCODABLE: u64 = (1 << 45) - 1;

/// Per-position sums of qualifier weights are normalised to this base.
const CARRY_BASE: u64 = 65;

/// Largest value the wrapping emitter writes as a single character.
const WRAP_LIMIT: u64 = 62;

/// Alphabet character at `index`, or a blank when out of range.
fn symbol(index: u64) -> char {
    usize::try_from(index).ok().and_then(|i| ALPHABET.get(i)).map_or(' ', |&b| char::from(b))
}

/// Encodes `value` so that `encode(x) > encode(y)` byte-wise whenever `x > y`.
///
/// Values above [`MAX_ENCODABLE`] saturate to `"zzzzzzzz"`.
#[must_use]
pub fn encode(value: u64) -> String {
    let value = value.min(MAX_ENCODABLE);
    let extra = (0..7_u64).find(|&i| value < 1_u64 << (i * 6 + 3)).unwrap_or(7);

    let mut out = String::with_capacity(8);
    out.push(symbol((extra << 3) | ((value >> (6 * extra)) & 0x7)));
    for group in (0..extra).rev() {
        out.push(symbol((value >> (6 * group)) & 0x3f));
    }
    out
}

/// Weight of a qualifier character: alphabet position plus one, `0` for anything else.
///
/// The offset keeps a missing character (weight 0) distinct from `-` (weight 1).
#[must_use]
pub fn decode_weight(c: char) -> u32 {
    u8::try_from(c)
        .ok()
        .and_then(|b| ALPHABET.binary_search(&b).ok())
        .and_then(|index| u32::try_from(index + 1).ok())
        .unwrap_or(0)
}

/// Folds qualifiers into one encoded string of per-position weight sums.
///
/// Each qualifier is cut to `significant_digits` characters (`None` keeps all of them).
/// Position sums are normalised to base 65 from the last position towards the first, the
/// final carry landing in position 0. Position 0 is written with [`encode`], every other
/// position as a single character, or as repeated `z` followed by the remainder for the rare
/// value above 62. Returns an empty string when every truncated qualifier is empty.
///
/// The result depends on the order of `qualifiers`.
#[must_use]
pub fn fold_qualifiers<S: AsRef<str>>(qualifiers: &[S], significant_digits: Option<usize>) -> String {
    let limit = significant_digits.unwrap_or(usize::MAX);
    let truncated: Vec<Vec<char>> =
        qualifiers.iter().map(|q| q.as_ref().chars().take(limit).collect()).collect();

    let width = truncated.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let mut sums = vec![0_u64; width];
    for qualifier in &truncated {
        for (position, c) in qualifier.iter().enumerate() {
            sums[position] += u64::from(decode_weight(*c));
        }
    }

    let mut carry = 0;
    for sum in sums.iter_mut().skip(1).rev() {
        *sum += carry;
        carry = *sum / CARRY_BASE;
        *sum %= CARRY_BASE;
    }
    sums[0] += carry;

    let mut out = encode(sums[0]);
    for &sum in &sums[1..] {
        push_wrapping(&mut out, sum);
    }
    out
}

fn push_wrapping(out: &mut String, mut value: u64) {
    while value > WRAP_LIMIT {
        out.push('z');
        value -= WRAP_LIMIT + 1;
    }
    out.push(symbol(value));
}

/// Drops trailing `-` characters, the zero digit of the alphabet.
#[must_use]
pub fn strip_trailing_blanks(s: &str) -> &str {
    s.trim_end_matches('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_is_sorted_and_distinct() {
        assert!(ALPHABET.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn reference_encodings() {
        let cases = [
            (0, "-"),
            (7, "6"),
            (8, "77"),
            (63, "7z"),
            (64, "8-"),
            (511, "Ez"),
            (512, "F7-"),
            ((1 << 32) - 1, "fzzzzz"),
            (MAX_ENCODABLE, "zzzzzzzz"),
        ];
        for (value, expected) in cases {
            assert_eq!(encode(value), expected, "encode({value})");
        }
    }

    #[test]
    fn oversized_values_saturate() {
        assert_eq!(encode(MAX_ENCODABLE + 1), "zzzzzzzz");
        assert_eq!(encode(u64::MAX), "zzzzzzzz");
    }

    #[test]
    fn weights_are_offset_by_one() {
        assert_eq!(decode_weight('-'), 1);
        assert_eq!(decode_weight('0'), 2);
        assert_eq!(decode_weight('z'), 64);
        assert_eq!(decode_weight(' '), 0);
        assert_eq!(decode_weight('.'), 0);
        assert_eq!(decode_weight('é'), 0);
    }

    #[test]
    fn fold_of_nothing_is_empty() {
        assert_eq!(fold_qualifiers::<&str>(&[], None), "");
        assert_eq!(fold_qualifiers(&["", ""], None), "");
        assert_eq!(fold_qualifiers(&["abc"], Some(0)), "");
    }

    #[test]
    fn fold_of_two_short_qualifiers() {
        // "v1" + "v2": position sums are [60 + 60, 3 + 4] = [120, 7].
        // 120 encodes as "8s", 7 is written as '6'.
        assert_eq!(fold_qualifiers(&["v1", "v2"], None), "8s6");
    }

    #[test]
    fn carry_moves_towards_the_first_position() {
        // Two 'z' at position 1 sum to 128 = 1 * 65 + 63.
        // Position 0 becomes 2 + 1 carry, position 1 wraps 63 into "z-".
        assert_eq!(fold_qualifiers(&["-z", "-z"], None), "2z-");
    }

    #[test]
    fn significant_digits_truncate_before_summing() {
        assert_eq!(fold_qualifiers(&["v1abc", "v2xyz"], Some(2)), fold_qualifiers(&["v1", "v2"], None));
    }

    #[test]
    fn trailing_zero_digits_are_stripped() {
        assert_eq!(strip_trailing_blanks("8---"), "8");
        assert_eq!(strip_trailing_blanks("---"), "");
        assert_eq!(strip_trailing_blanks("a-b"), "a-b");
    }
}
