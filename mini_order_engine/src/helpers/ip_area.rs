use std::net::IpAddr;

pub const LOCAL_AREA: &str = "Local network";

/// Describes where a request came from, as far as that can be told without a geolocation database.
///
/// Loopback and private addresses (including IPv4-mapped IPv6 forms such as `::ffff:127.0.0.1`) are reported as the
/// local network. Anything else is unknown, and `None` is returned.
pub fn locate_ip(ip: &str) -> Option<String> {
    let ip = ip.trim();
    if ip.eq_ignore_ascii_case("localhost") {
        return Some(LOCAL_AREA.to_string());
    }
    let addr = ip.parse::<IpAddr>().ok()?;
    let addr = match addr {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    };
    let local = match addr {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00,
    };
    local.then(|| LOCAL_AREA.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn local_addresses() {
        for ip in ["127.0.0.1", "::1", "localhost", "192.168.1.20", "10.0.0.8", "::ffff:127.0.0.1", "fd00::1"] {
            assert_eq!(locate_ip(ip).as_deref(), Some(LOCAL_AREA), "{ip}");
        }
    }

    #[test]
    fn public_and_invalid_addresses() {
        assert_eq!(locate_ip("8.8.8.8"), None);
        assert_eq!(locate_ip("2001:4860:4860::8888"), None);
        assert_eq!(locate_ip("not an ip"), None);
    }
}
