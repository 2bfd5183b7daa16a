/// Convert a string to an integer the way Knight does.
///
/// Leading spaces are skipped, then an optional `-`, then as many ASCII
/// digits as follow. Anything else ends the number; no digits gives `0`.
/// Overflow wraps.
pub fn atoi(s: &str) -> i64 {
    let bytes = s.as_bytes();
    let mut i = 0;

    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }

    let negative = bytes.get(i) == Some(&b'-');
    if negative {
        i += 1;
    }

    let mut n: i64 = 0;
    for &b in &bytes[i..] {
        if !b.is_ascii_digit() {
            break;
        }
        n = n.wrapping_mul(10).wrapping_add(i64::from(b - b'0'));
    }

    if negative { n.wrapping_neg() } else { n }
}
