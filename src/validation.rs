//! IP address shape checks
//!
//! These are permissive shape checks, not full RFC parsing: IPv6 accepts
//! any 3-8 colon-separated groups of up to four hex digits, so ambiguous
//! `::` compaction passes.

/// Four dot-separated decimal octets, each 0-255
pub fn is_valid_ipv4(ip: &str) -> bool {
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return false;
    }

    parts.iter().all(|part| {
        !part.is_empty()
            && part.bytes().all(|b| b.is_ascii_digit())
            && part.parse::<u32>().map(|n| n <= 255).unwrap_or(false)
    })
}

/// 3-8 colon-separated groups, each empty or up to four hex digits
pub fn is_valid_ipv6(ip: &str) -> bool {
    let parts: Vec<&str> = ip.split(':').collect();
    if parts.len() < 3 || parts.len() > 8 {
        return false;
    }

    parts
        .iter()
        .all(|part| part.len() <= 4 && part.bytes().all(|b| b.is_ascii_hexdigit()))
}

pub fn is_valid_ip(ip: &str) -> bool {
    is_valid_ipv4(ip) || is_valid_ipv6(ip)
}
