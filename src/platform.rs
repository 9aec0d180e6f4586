use serde::Serialize;
use url::Url;

pub const GENERIC_PLATFORM: &str = "generic";

/// Checked in order; the first domain matching the host wins. Matching is by
/// domain suffix: the host equals the domain or is a subdomain of it, so
/// `dropbox.com` does not match `x.com`.
const DOMAIN_PLATFORMS: [(&str, &str); 6] = [
    ("youtube.com", "youtube"),
    ("youtu.be", "youtube"),
    ("tiktok.com", "tiktok"),
    ("instagram.com", "instagram"),
    ("twitter.com", "twitter"),
    ("x.com", "twitter"),
];

#[derive(Debug, Serialize)]
pub struct PlatformInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub domains: &'static [&'static str],
    pub supported_formats: &'static [&'static str],
}

pub static PLATFORMS: [PlatformInfo; 5] = [
    PlatformInfo {
        id: "youtube",
        name: "YouTube",
        domains: &["youtube.com", "youtu.be"],
        supported_formats: &["mp4", "webm", "m4a", "mp3"],
    },
    PlatformInfo {
        id: "tiktok",
        name: "TikTok",
        domains: &["tiktok.com"],
        supported_formats: &["mp4"],
    },
    PlatformInfo {
        id: "instagram",
        name: "Instagram",
        domains: &["instagram.com"],
        supported_formats: &["mp4", "jpg"],
    },
    PlatformInfo {
        id: "twitter",
        name: "Twitter/X",
        domains: &["twitter.com", "x.com"],
        supported_formats: &["mp4"],
    },
    PlatformInfo {
        id: GENERIC_PLATFORM,
        name: "Generic (via yt-dlp)",
        domains: &[],
        supported_formats: &["various"],
    },
];

pub fn identify_platform(url: &Url) -> &'static str {
    let Some(host) = url.host_str() else {
        return GENERIC_PLATFORM;
    };
    let host = host.to_ascii_lowercase();

    DOMAIN_PLATFORMS
        .iter()
        .find(|(domain, _)| is_domain_match(&host, domain))
        .map(|(_, platform)| *platform)
        .unwrap_or(GENERIC_PLATFORM)
}

fn is_domain_match(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
