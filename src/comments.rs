//! Keeps an embedded discussion thread pointed at the current page.

use serde_json::{json, Value};
use tracing::{debug, info};

pub const GISCUS_ORIGIN: &str = "https://giscus.app";

/// One-way channel into the comment frame. No reply is expected.
pub trait MessageSink {
    fn post_message(&mut self, message: &Value, target_origin: &str);
}

/// Sink for hosts without a comment frame: the message goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn post_message(&mut self, message: &Value, target_origin: &str) {
        info!(origin = target_origin, %message, "comment thread reconfigured");
    }
}

pub fn set_term_message(path: &str) -> Value {
    json!({ "giscus": { "setConfig": { "term": path } } })
}

#[derive(Debug)]
pub struct CommentThreadSync<S: MessageSink> {
    frame: Option<S>,
    origin: String,
    current_path: Option<String>,
}

impl<S: MessageSink> CommentThreadSync<S> {
    pub fn new(frame: Option<S>, origin: impl Into<String>) -> Self {
        Self {
            frame,
            origin: origin.into(),
            current_path: None,
        }
    }

    pub fn current_path(&self) -> Option<&str> {
        self.current_path.as_deref()
    }

    pub fn frame(&self) -> Option<&S> {
        self.frame.as_ref()
    }

    /// Called on every navigation. Posts only when the path actually changed
    /// and a frame is mounted; returns whether a message went out.
    pub fn on_route_change(&mut self, path: &str) -> bool {
        if self.current_path.as_deref() == Some(path) {
            return false;
        }
        self.current_path = Some(path.to_string());

        let Some(frame) = self.frame.as_mut() else {
            debug!(path, "no comment frame mounted");
            return false;
        };
        frame.post_message(&set_term_message(path), &self.origin);
        true
    }
}
