use std::fmt;

/// Helper struct that wraps bytes and improves their [`std::fmt::Debug`] formatting.
/// Tries to print as many bytes as possible just like regular characters; others are escaped.
pub struct PrettyBytes<'a>(pub &'a [u8]);

impl fmt::Debug for PrettyBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b\"")?;
        for &b in self.0 {
            match b {
                // human readable symbols, alphabet, etc
                b' '..b'~' => write!(f, "{}", b as char)?,
                // other bytes, like enter/backspace/newline
                _ => write!(f, "\\x{:02x}", b)?,
            }
        }
        write!(f, "\"")
    }
}

/// Parses a human readable byte size like `128`, `1G` or `-1.5M` from untrusted input.
/// Only the first character after the number selects the scale, so `1G`, `1GB` and
/// `1GiB` all parse the same; anything after that character is ignored.
pub fn parse_human_readable_bytes(src: &str) -> Option<i64> {
    if src.is_empty() {
        return None;
    }

    let (negative, rest) = match src.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, src),
    };

    let number_end = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(rest.len());
    let number: f64 = rest[..number_end].parse().ok()?;

    let scale: i64 = match rest[number_end..].chars().next() {
        Some('E' | 'e') => 1 << 60,
        Some('P' | 'p') => 1 << 50,
        Some('T' | 't') => 1 << 40,
        Some('G' | 'g') => 1 << 30,
        Some('M' | 'm') => 1 << 20,
        Some('K' | 'k') => 1 << 10,
        Some('B' | 'b') | None => 1,
        Some(_) => return None,
    };

    let value = number * scale as f64;
    if value > i64::MAX as f64 {
        return None;
    }

    let bytes = (value + 0.5) as i64;
    Some(if negative { -bytes } else { bytes })
}

/// Parses a double from untrusted input. Accepts `-inf`/`+inf` in any case,
/// rejects NaN and trailing garbage.
pub fn parse_double(src: &str) -> Option<f64> {
    if src.is_empty() {
        return None;
    }
    if src.eq_ignore_ascii_case("-inf") {
        return Some(f64::NEG_INFINITY);
    }
    if src.eq_ignore_ascii_case("+inf") {
        return Some(f64::INFINITY);
    }

    let value: f64 = src.parse().ok()?;
    if value.is_nan() {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_bytes() {
        assert_eq!(format!("{:?}", PrettyBytes(b"user:1")), "b\"user:1\"");
        assert_eq!(format!("{:?}", PrettyBytes(b"a\n\x7f")), "b\"a\\x0a\\x7f\"");
    }

    #[test]
    fn test_parse_human_readable_bytes() {
        assert_eq!(parse_human_readable_bytes("128"), Some(128));
        assert_eq!(parse_human_readable_bytes("1K"), Some(1024));
        assert_eq!(parse_human_readable_bytes("1G"), Some(1 << 30));
        assert_eq!(parse_human_readable_bytes("1GB"), Some(1 << 30));
        assert_eq!(parse_human_readable_bytes("1GiB"), Some(1 << 30));
        assert_eq!(parse_human_readable_bytes("1.5M"), Some(3 << 19));
        assert_eq!(parse_human_readable_bytes("-1K"), Some(-1024));
        assert_eq!(parse_human_readable_bytes(""), None);
        assert_eq!(parse_human_readable_bytes("G"), None);
        assert_eq!(parse_human_readable_bytes("1X"), None);
    }

    #[test]
    fn test_parse_double() {
        assert_eq!(parse_double("1.25"), Some(1.25));
        assert_eq!(parse_double("-3"), Some(-3.0));
        assert_eq!(parse_double("+inf"), Some(f64::INFINITY));
        assert_eq!(parse_double("-INF"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_double("nan"), None);
        assert_eq!(parse_double("12abc"), None);
        assert_eq!(parse_double(""), None);
    }
}
