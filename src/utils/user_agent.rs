//! Heuristic User-Agent classification.
//!
//! Case-insensitive substring rules, first match wins. This is not a full
//! parser: ambiguous or spoofed strings fall through to `Unknown` / `Desktop`.

use serde::Serialize;

/// Browser, device class and operating system derived from a User-Agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub browser: &'static str,
    pub device: &'static str,
    pub os: &'static str,
}

pub fn classify(user_agent: &str) -> ClientInfo {
    let ua = user_agent.to_lowercase();

    ClientInfo {
        browser: browser(&ua),
        device: device(&ua),
        os: os(&ua),
    }
}

fn browser(ua: &str) -> &'static str {
    if ua.contains("chrome") && !ua.contains("edg") {
        "Chrome"
    } else if ua.contains("safari") && !ua.contains("chrome") {
        "Safari"
    } else if ua.contains("firefox") {
        "Firefox"
    } else if ua.contains("edg") {
        "Edge"
    } else if ua.contains("opera") || ua.contains("opr") {
        "Opera"
    } else {
        "Unknown"
    }
}

fn device(ua: &str) -> &'static str {
    if ua.contains("mobile") {
        "Mobile"
    } else if ua.contains("tablet") || ua.contains("ipad") {
        "Tablet"
    } else {
        "Desktop"
    }
}

fn os(ua: &str) -> &'static str {
    if ua.contains("windows") {
        "Windows"
    } else if ua.contains("mac") {
        "MacOS"
    } else if ua.contains("linux") {
        "Linux"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("ios") || ua.contains("iphone") {
        "iOS"
    } else {
        "Unknown"
    }
}
