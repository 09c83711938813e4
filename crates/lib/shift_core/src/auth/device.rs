//! Client classification from the `User-Agent` header.
//!
//! Scripted clients are recorded with a fixed "headless" marker; browsers are
//! described as `"{browser} {version} on {os} {os_version}"`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Descriptor stored for non-browser clients.
pub const HEADLESS_DESCRIPTOR: &str = "User has logged in using a headless request!";

static HEADLESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)postman|insomnia|curl|wget|axios|node-fetch|undici|python-requests|httpie|okhttp|go-http-client|httpclient|\bfetch\b")
        .expect("valid regex")
});

// Order matters: Edge and Opera also advertise Chrome, Chrome advertises Safari.
static BROWSERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("Edge", r"Edg(?:e|A|iOS)?/([\d.]+)"),
        ("Opera", r"(?:OPR|Opera)/([\d.]+)"),
        ("Samsung Internet", r"SamsungBrowser/([\d.]+)"),
        ("Firefox", r"(?:Firefox|FxiOS)/([\d.]+)"),
        ("Chrome", r"(?:Chrome|CriOS)/([\d.]+)"),
        ("Safari", r"Version/([\d.]+).*Safari/"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid regex")))
    .collect()
});

static OPERATING_SYSTEMS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("Windows", r"Windows NT ([\d.]+)"),
        ("iOS", r"(?:iPhone|iPad|iPod).*? OS ([\d_]+)"),
        ("Mac OS", r"Mac OS X ([\d_.]+)"),
        ("Android", r"Android ([\d.]+)"),
        ("Chrome OS", r"CrOS \S+ ([\d.]+)"),
        ("Linux", r"(Linux)"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid regex")))
    .collect()
});

/// What kind of client started a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceDescriptor {
    Headless,
    Browser {
        browser: String,
        browser_version: String,
        os: String,
        os_version: String,
    },
}

impl DeviceDescriptor {
    /// Classify a raw `User-Agent`. A missing or blank header counts as headless.
    pub fn classify(user_agent: Option<&str>) -> Self {
        let ua = match user_agent.map(str::trim) {
            Some(ua) if !ua.is_empty() => ua,
            _ => return Self::Headless,
        };
        if HEADLESS.is_match(ua) {
            return Self::Headless;
        }

        let (browser, browser_version) = first_match(&BROWSERS, ua);
        let (os, os_version) = first_match(&OPERATING_SYSTEMS, ua);
        let os_version = if os == "Linux" {
            String::new()
        } else {
            os_version.replace('_', ".")
        };

        Self::Browser {
            browser,
            browser_version,
            os,
            os_version,
        }
    }
}

fn first_match(table: &[(&'static str, Regex)], ua: &str) -> (String, String) {
    table
        .iter()
        .find_map(|(name, re)| {
            re.captures(ua).map(|caps| {
                let version = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                (name.to_string(), version.to_string())
            })
        })
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Headless => f.write_str(HEADLESS_DESCRIPTOR),
            Self::Browser {
                browser,
                browser_version,
                os,
                os_version,
            } => {
                let left = join_nonempty(browser, browser_version);
                let right = join_nonempty(os, os_version);
                write!(f, "{left} on {right}")
            }
        }
    }
}

fn join_nonempty(name: &str, version: &str) -> String {
    if version.is_empty() {
        name.to_string()
    } else {
        format!("{name} {version}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.130 Safari/537.36";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

    #[test]
    fn scripted_clients_are_headless() {
        for ua in ["PostmanRuntime/7.36.0", "curl/8.4.0", "axios/1.6.2", "node-fetch/1.0"] {
            assert_eq!(DeviceDescriptor::classify(Some(ua)), DeviceDescriptor::Headless, "{ua}");
        }
        assert_eq!(DeviceDescriptor::classify(None), DeviceDescriptor::Headless);
        assert_eq!(DeviceDescriptor::classify(Some("  ")), DeviceDescriptor::Headless);
        assert_eq!(DeviceDescriptor::Headless.to_string(), HEADLESS_DESCRIPTOR);
    }

    #[test]
    fn describes_chrome_on_windows() {
        let d = DeviceDescriptor::classify(Some(CHROME_WIN));
        assert_eq!(d.to_string(), "Chrome 120.0.6099.130 on Windows 10.0");
    }

    #[test]
    fn edge_is_not_reported_as_chrome() {
        let d = DeviceDescriptor::classify(Some(EDGE_WIN));
        assert_eq!(d.to_string(), "Edge 120.0.2210.91 on Windows 10.0");
    }

    #[test]
    fn describes_safari_on_mac() {
        let d = DeviceDescriptor::classify(Some(SAFARI_MAC));
        assert_eq!(d.to_string(), "Safari 17.1 on Mac OS 10.15.7");
    }

    #[test]
    fn linux_has_no_version() {
        let d = DeviceDescriptor::classify(Some(FIREFOX_LINUX));
        assert_eq!(d.to_string(), "Firefox 121.0 on Linux");
    }

    #[test]
    fn unknown_agent_still_describes_something() {
        let d = DeviceDescriptor::classify(Some("SomethingElse/1.0"));
        assert_eq!(d.to_string(), "Unknown on Unknown");
    }
}
