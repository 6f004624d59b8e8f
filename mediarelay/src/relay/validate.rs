//! Input checks run before any outbound call.

use std::net::IpAddr;
use url::{Host, Url};

/// A guild ID is 15 to 21 ASCII decimal digits.
pub fn is_valid_guild_id(guild_id: &str) -> bool {
    (15..=21).contains(&guild_id.len()) && guild_id.bytes().all(|b| b.is_ascii_digit())
}

/// Longest content URL accepted, in bytes.
pub const MAX_URL_LEN: usize = 2083;

/// Parse `content` as an absolute http(s) URL.
///
/// The raw string must be at most [`MAX_URL_LEN`] bytes and contain no whitespace. Domain hosts
/// must be fully qualified (at least two labels, alphabetic TLD). IP literals are accepted unless
/// unspecified (`0.0.0.0`, `::`).
pub fn parse_content_url(content: &str) -> Option<Url> {
    if content.len() > MAX_URL_LEN || content.chars().any(char::is_whitespace) {
        return None;
    }

    let url = Url::parse(content).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let acceptable_host = match url.host()? {
        Host::Domain(domain) => is_qualified_domain(domain),
        Host::Ipv4(ip) => !IpAddr::V4(ip).is_unspecified(),
        Host::Ipv6(ip) => !IpAddr::V6(ip).is_unspecified(),
    };

    acceptable_host.then_some(url)
}

fn is_qualified_domain(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return false;
    }

    let tld = labels[labels.len() - 1];
    tld.len() >= 2 && (tld.bytes().all(|b| b.is_ascii_alphabetic()) || tld.starts_with("xn--"))
}
