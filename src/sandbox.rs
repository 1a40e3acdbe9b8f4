use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use webbrowser::Browser;

const GO_SANDBOX_URL: &str = "https://codapi.org/embed/?sandbox=go&code=data%3A%3Bbase64%2CLcwxCsMwDEbhXaf4KyjYEHqOjNm6dDGpbExtOTjqVHL3YvDwxvcdYf%2BEJKghK1GuR%2BsGjtWYKH51R%2Boi5jRUwWk9a%2FL4EYARYrXH1rNadLxKKW3B%2Fby9lBeMw9M1lcG7eU6Sn62XN3u6%2Fg%3D%3D";
const POSTGRES_SANDBOX_URL: &str = "https://codapi.org/embed/?sandbox=postgres&code=data%3A%3Bbase64%2CK07NSU0uUVD3SM3JyddRCM8vyklRVFdILFbITS0uTkxPtQYA";

/// Which hosted code runner a task embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum SandboxKind {
    Go,
    #[strum(serialize = "PostgreSQL")]
    Postgres,
    #[strum(serialize = "MongoDB")]
    Mongodb,
}

impl SandboxKind {
    fn default_url(self) -> &'static str {
        match self {
            // the MongoDB exercises are written against the Go driver
            SandboxKind::Go | SandboxKind::Mongodb => GO_SANDBOX_URL,
            SandboxKind::Postgres => POSTGRES_SANDBOX_URL,
        }
    }
}

/// Opaque child element of a task: a hosted editor the learner runs code in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxEmbed {
    pub kind: SandboxKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SandboxEmbed {
    pub fn new(kind: SandboxKind) -> Self {
        Self { kind, url: None }
    }

    pub fn url(&self) -> &str {
        self.url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_url())
    }

    pub fn heading(&self) -> String {
        format!("Online code editor for {}", self.kind)
    }

    /// Code typed into the hosted editor is not kept between visits.
    pub fn notice(&self) -> &'static str {
        "Code in the online editor is lost on reload; keep a copy of anything important."
    }

    /// Open the embed in the user's browser. Returns whether a browser took it.
    pub fn open(&self) -> bool {
        if !Browser::is_available() {
            warn!(url = self.url(), "no browser available for sandbox");
            return false;
        }
        match webbrowser::open(self.url()) {
            Ok(()) => {
                info!(kind = %self.kind, "opened sandbox");
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to open sandbox");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls_follow_kind() {
        assert!(SandboxEmbed::new(SandboxKind::Go)
            .url()
            .contains("sandbox=go"));
        assert!(SandboxEmbed::new(SandboxKind::Postgres)
            .url()
            .contains("sandbox=postgres"));
        assert_eq!(
            SandboxEmbed::new(SandboxKind::Mongodb).url(),
            SandboxEmbed::new(SandboxKind::Go).url()
        );
    }

    #[test]
    fn custom_url_wins() {
        let embed = SandboxEmbed {
            kind: SandboxKind::Go,
            url: Some("https://example.org/play".to_string()),
        };
        assert_eq!(embed.url(), "https://example.org/play");
    }

    #[test]
    fn headings_name_the_language() {
        assert_eq!(
            SandboxEmbed::new(SandboxKind::Postgres).heading(),
            "Online code editor for PostgreSQL"
        );
        assert_eq!(SandboxKind::Go.to_string(), "Go");
    }

    #[test]
    fn deserializes_lowercase_kinds() {
        let embed: SandboxEmbed = serde_json::from_str(r#"{"kind":"mongodb"}"#).unwrap();
        assert_eq!(embed.kind, SandboxKind::Mongodb);
        assert_eq!(embed.url, None);
    }
}
