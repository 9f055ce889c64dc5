use std::{net::IpAddr, str::FromStr};

use actix_web::{http::header::USER_AGENT, HttpRequest};
use log::{debug, trace};
use mini_order_engine::RequestOrigin;
use regex::Regex;

use crate::config::ProxyConfig;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        // The header may hold a chain of proxies. The client is the first entry.
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        if let Ok(re) = Regex::new(r#"for="?(?P<ip>[^;,"]+)"#) {
            result = req
                .headers()
                .get("Forwarded")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| re.captures(v))
                .and_then(|caps| caps.name("ip"))
                .map(|m| m.as_str())
                .and_then(|s| IpAddr::from_str(s).ok());
        }
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr
    })
}

pub fn user_agent(req: &HttpRequest) -> String {
    req.headers().get(USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string()
}

/// The client address and user agent of a request, for the operation log.
pub fn request_origin(req: &HttpRequest, proxy: &ProxyConfig) -> RequestOrigin {
    let ip = get_remote_ip(req, proxy.use_x_forwarded_for, proxy.use_forwarded)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    RequestOrigin::new(ip, user_agent(req))
}
