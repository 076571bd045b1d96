//! Shape check for `ipv4:port` proxy tokens

use once_cell::sync::Lazy;
use regex::Regex;

/// Four dot-separated groups of 1-3 digits, a colon and a port.
/// Octet and port ranges are not checked.
static IPV4_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}:\d+$").expect("Invalid IPV4:PORT regex")
});

/// Whether `candidate` looks like `a.b.c.d:port`
pub fn is_well_formed(candidate: &str) -> bool {
    candidate.is_ascii() && IPV4_PORT_REGEX.is_match(candidate)
}

/// Keep only well-formed items, preserving order
pub fn well_formed<'a, T, I>(items: I) -> impl Iterator<Item = &'a T>
where
    T: AsRef<str> + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().filter(|item| is_well_formed(item.as_ref()))
}
