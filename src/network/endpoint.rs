//! Server address handling
//!
//! Normalizes what the user typed into a base URL the HTTP client can use.

/// Port of the web front end when none is given
pub const DEFAULT_PORT: u16 = 9001;

/// Path of the liveness endpoint, relative to the base URL
pub const BEACON_PATH: &str = "/ajax/beacon";

/// Parse a server address into `scheme://host:port[/prefix]`
///
/// Supports inputs like:
/// - localhost
/// - 192.168.1.100:9001
/// - http://news.example.com/reader
/// - https://[::1]:8443
pub fn parse_base_url(input: &str) -> Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Server address cannot be empty".to_string());
    }

    let (scheme, rest) = if let Some(rest) = trimmed.strip_prefix("http://") {
        ("http", rest)
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        ("https", rest)
    } else if trimmed.contains("://") {
        return Err("Only http:// and https:// are supported".to_string());
    } else {
        ("http", trimmed)
    };

    let (host_port, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], rest[idx..].trim_end_matches('/')),
        None => (rest, ""),
    };

    let default_port = if scheme == "https" { 443 } else { DEFAULT_PORT };

    let (host, port) = if host_port.starts_with('[') {
        // IPv6 format: [::1]:port
        let bracket_end = host_port
            .find(']')
            .ok_or_else(|| "Invalid IPv6 address format".to_string())?;
        let host = &host_port[..=bracket_end];
        let port = match host_port[bracket_end + 1..].strip_prefix(':') {
            Some(p) => p.parse::<u16>().map_err(|_| format!("Invalid port: {}", p))?,
            None => default_port,
        };
        (host.to_string(), port)
    } else {
        let parts: Vec<&str> = host_port.rsplitn(2, ':').collect();
        match parts.len() {
            2 => {
                let port = parts[0]
                    .parse::<u16>()
                    .map_err(|_| format!("Invalid port: {}", parts[0]))?;
                (parts[1].to_string(), port)
            }
            _ => (host_port.to_string(), default_port),
        }
    };

    if host.is_empty() {
        return Err("Host cannot be empty".to_string());
    }

    Ok(format!("{}://{}:{}{}", scheme, host, port, path))
}

/// Full URL of the liveness endpoint below `base`
pub fn beacon_url(base: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), BEACON_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url() {
        assert_eq!(parse_base_url("localhost").unwrap(), "http://localhost:9001");
        assert_eq!(
            parse_base_url("192.168.1.100:8080").unwrap(),
            "http://192.168.1.100:8080"
        );
        assert_eq!(
            parse_base_url("http://news.example.com/reader/").unwrap(),
            "http://news.example.com:9001/reader"
        );
        assert_eq!(parse_base_url("https://[::1]").unwrap(), "https://[::1]:443");
        assert_eq!(
            parse_base_url("https://[::1]:8443").unwrap(),
            "https://[::1]:8443"
        );

        // Malformed addresses
        assert!(parse_base_url("ftp://localhost").is_err());
        assert!(parse_base_url("http://").is_err());
        assert!(parse_base_url("").is_err());
        assert!(parse_base_url("host:port:extra").is_err());
        assert!(parse_base_url("[::1:9001").is_err());
    }

    #[test]
    fn test_beacon_url() {
        assert_eq!(
            beacon_url("http://localhost:9001"),
            "http://localhost:9001/ajax/beacon"
        );
        assert_eq!(
            beacon_url("http://localhost:9001/reader/"),
            "http://localhost:9001/reader/ajax/beacon"
        );
    }
}
