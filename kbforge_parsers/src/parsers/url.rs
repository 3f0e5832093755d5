use std::sync::OnceLock;

use kbforge_core::component::for_uri;
use regex::Regex;
use tracing::debug;

use super::TermParser;

static WITH_PROTOCOL: OnceLock<Regex> = OnceLock::new();
static WITHOUT_PROTOCOL: OnceLock<Regex> = OnceLock::new();

// Backslashes are allowed for already escaped text.
#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn with_protocol() -> &'static Regex {
    WITH_PROTOCOL.get_or_init(|| {
        Regex::new(r"(https?)://([-A-Za-z0-9_./\\]+)")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn without_protocol() -> &'static Regex {
    WITHOUT_PROTOCOL.get_or_init(|| {
        Regex::new(r"(www\.[-A-Za-z0-9_./\\]+)")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Finds URLs with two fixed patterns instead of the shared rule list, since
/// underscores in URLs would collide with result markers. Bare `www.` hosts
/// are only considered when no URL with a protocol was found and get
/// `http://` prepended.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlParser;

impl TermParser for UrlParser {
    fn name(&self) -> &'static str {
        "url"
    }

    fn extract_list(&self, input: &str) -> Vec<String> {
        let mut urls: Vec<String> = with_protocol()
            .captures_iter(input)
            .map(|caps| for_uri(&format!("{}://{}", &caps[1], &caps[2])))
            .collect();

        if urls.is_empty() {
            urls = without_protocol()
                .captures_iter(input)
                .map(|caps| for_uri(&format!("http://{}", &caps[1])))
                .collect();
        }

        if urls.is_empty() {
            debug!("Could not find URL in {input:?}");
        }
        urls
    }
}
