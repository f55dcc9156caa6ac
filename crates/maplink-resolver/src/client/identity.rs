/// Client signature presented to the provider.
///
/// Providers vary redirect behavior by user agent, so the manual follower
/// runs once per identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Mobile,
    Desktop,
}

const MOBILE_UA: &str = "Mozilla/5.0 (Linux; Android 12; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

impl Identity {
    #[must_use]
    pub fn user_agent(self) -> &'static str {
        match self {
            Self::Mobile => MOBILE_UA,
            Self::Desktop => DESKTOP_UA,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}
