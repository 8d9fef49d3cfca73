//! Client IP extraction utilities.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

use crate::cli::ClientIpHeader;

/// Extract the client IP address for rate limiting.
///
/// If `ip_header` is set, the IP is read from that header and an error is returned
/// when the header is missing or unparsable (no fallback to the socket address).
///
/// Otherwise the socket address from `ConnectInfo` is used.
pub fn extract_client_ip(
    request: &Request,
    ip_header: Option<ClientIpHeader>,
) -> Result<String, &'static str> {
    match ip_header {
        Some(source) => {
            let header_value = request
                .headers()
                .get(source.header_name())
                .ok_or("IP header not present")?
                .to_str()
                .map_err(|_| "IP header contains invalid characters")?;
            source.parse(header_value)
        }
        None => request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .ok_or("No client IP available"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let request = HttpRequest::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_client_ip(&request, Some(ClientIpHeader::XForwardedFor)),
            Ok("203.0.113.7".to_string())
        );
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let request = HttpRequest::builder().body(Body::empty()).unwrap();
        assert!(extract_client_ip(&request, Some(ClientIpHeader::XRealIp)).is_err());
    }

    #[test]
    fn test_connect_info_fallback() {
        let mut request = HttpRequest::builder().body(Body::empty()).unwrap();
        let addr: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(
            extract_client_ip(&request, None),
            Ok("192.0.2.1".to_string())
        );
    }
}
