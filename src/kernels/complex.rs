//! Pure parser for complex-number literals.
//!
//! Accepted forms (whitespace only around the literal, never inside it):
//! `3+4j`, `3-4j`, `(3+4j)`, `4j`, `-4j`, `j`, `-j`, `1e-3+2e5j`, and plain reals
//! such as `3`. The imaginary unit may be written `j`, `J`, `i`, or `I`.
//! NaN components are rejected.

use num_complex::Complex64;

fn is_unit(c: char) -> bool {
    matches!(c, 'i' | 'I' | 'j' | 'J')
}

fn parse_component(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// A coefficient that may be a bare sign, as in `3+j`.
fn parse_coefficient(text: &str) -> Option<f64> {
    match text {
        "" | "+" => Some(1.0),
        "-" => Some(-1.0),
        _ => parse_component(text),
    }
}

/// Byte index of the sign separating the real from the imaginary part: the last
/// `+` or `-` that is neither leading nor part of an exponent.
fn split_index(core: &str) -> Option<usize> {
    let bytes = core.as_bytes();
    (1..bytes.len())
        .rev()
        .find(|&idx| matches!(bytes[idx], b'+' | b'-') && !matches!(bytes[idx - 1], b'e' | b'E'))
}

pub fn parse_complex(text: &str) -> Option<Complex64> {
    let mut s = text.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        s = inner.trim();
    }
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return None;
    }

    let last = s.chars().last()?;
    if !is_unit(last) {
        if s.chars().any(is_unit) {
            return None;
        }
        return parse_component(s).map(|re| Complex64::new(re, 0.0));
    }

    let core = &s[..s.len() - last.len_utf8()];
    if core.chars().any(is_unit) {
        return None;
    }
    match split_index(core) {
        Some(idx) => {
            let (re_str, im_str) = core.split_at(idx);
            let re = parse_component(re_str)?;
            let im = parse_coefficient(im_str)?;
            Some(Complex64::new(re, im))
        }
        None => parse_coefficient(core).map(|im| Complex64::new(0.0, im)),
    }
}
