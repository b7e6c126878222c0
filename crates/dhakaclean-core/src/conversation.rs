//! Chat session: append-only history, one exchange in flight at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dhakaclean_gateway::prompts::CHAT_FALLBACK_REPLY;
use dhakaclean_gateway::AiGateway;
use dhakaclean_schema::{ChatMessage, GroundingChunk};
use thiserror::Error;

use crate::location::{locate, LocationProvider, DEFAULT_LOCATION_TIMEOUT};
use crate::routing::{route_message, Route};

pub const GREETING: &str = "Hello! I am your Dhaka Eco-Assistant. Ask me about waste separation, collection schedules, or where to drop off recyclables!";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is still pending")]
    Busy,
}

pub struct ConversationSession {
    gateway: Arc<AiGateway>,
    locator: Arc<dyn LocationProvider>,
    location_timeout: Duration,
    /// Never held across an await
    history: Mutex<Vec<ChatMessage>>,
    busy: AtomicBool,
}

impl ConversationSession {
    /// New session seeded with the assistant greeting.
    pub fn new(gateway: Arc<AiGateway>, locator: Arc<dyn LocationProvider>) -> Self {
        Self::with_history(gateway, locator, vec![ChatMessage::assistant(GREETING)])
    }

    pub fn empty(gateway: Arc<AiGateway>, locator: Arc<dyn LocationProvider>) -> Self {
        Self::with_history(gateway, locator, Vec::new())
    }

    fn with_history(
        gateway: Arc<AiGateway>,
        locator: Arc<dyn LocationProvider>,
        history: Vec<ChatMessage>,
    ) -> Self {
        Self {
            gateway,
            locator,
            location_timeout: DEFAULT_LOCATION_TIMEOUT,
            history: Mutex::new(history),
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        lock_history(&self.history).clone()
    }

    pub fn len(&self) -> usize {
        lock_history(&self.history).len()
    }

    pub fn is_empty(&self) -> bool {
        lock_history(&self.history).is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Send using the session's own location source.
    pub async fn send(&self, text: &str) -> Result<ChatMessage, ChatError> {
        self.send_with_location(text, self.locator.as_ref()).await
    }

    /// Send a user message and wait for the assistant reply.
    ///
    /// The user message is recorded before any remote call and stays even if
    /// the reply degrades to a fallback. Dropping the future mid-reply records
    /// the fallback reply, so history always alternates.
    pub async fn send_with_location(
        &self,
        text: &str,
        locator: &dyn LocationProvider,
    ) -> Result<ChatMessage, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let _busy = BusyGuard::acquire(&self.busy).ok_or(ChatError::Busy)?;

        let prior = {
            let mut history = lock_history(&self.history);
            let prior = history.clone();
            history.push(ChatMessage::user(text));
            prior
        };
        let pending = PendingReply::new(&self.history);

        let route = route_message(text);
        tracing::debug!(?route, history = prior.len(), "chat message routed");

        let reply_text = match route {
            Route::Location => self.location_reply(text, locator).await,
            Route::General => self.gateway.converse(&prior, text).await,
        };

        Ok(pending.complete(reply_text))
    }

    async fn location_reply(&self, text: &str, locator: &dyn LocationProvider) -> String {
        let position = locate(locator, self.location_timeout).await;
        let result = self.gateway.find_nearby(text, position).await;
        match format_sources(&result.chunks) {
            Some(sources) => format!("{}\n\nSources:\n{sources}", result.text),
            None => result.text,
        }
    }
}

/// One `• [label](uri)` line per usable citation; `None` when nothing is usable.
pub fn format_sources(chunks: &[GroundingChunk]) -> Option<String> {
    let lines: Vec<String> = chunks
        .iter()
        .filter_map(GroundingChunk::citation)
        .map(|c| c.render_line())
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn lock_history(history: &Mutex<Vec<ChatMessage>>) -> MutexGuard<'_, Vec<ChatMessage>> {
    history.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owes the history one assistant reply. Dropped unpaid, it records the
/// fallback reply instead.
struct PendingReply<'a> {
    history: &'a Mutex<Vec<ChatMessage>>,
    paid: bool,
}

impl<'a> PendingReply<'a> {
    fn new(history: &'a Mutex<Vec<ChatMessage>>) -> Self {
        Self {
            history,
            paid: false,
        }
    }

    fn complete(mut self, text: String) -> ChatMessage {
        let reply = ChatMessage::assistant(text);
        lock_history(self.history).push(reply.clone());
        self.paid = true;
        reply
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if !self.paid {
            tracing::warn!("chat exchange cancelled before the reply arrived");
            lock_history(self.history).push(ChatMessage::assistant(CHAT_FALLBACK_REPLY));
        }
    }
}

/// Holds the session's busy flag; clears it on drop, including cancellation.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhakaclean_schema::GroundingLink;

    #[test]
    fn format_sources_renders_and_skips() {
        let chunks = vec![
            GroundingChunk::web("https://a", Some("A")),
            GroundingChunk::maps("https://b", None),
            GroundingChunk::default(),
        ];
        let rendered = format_sources(&chunks).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines, vec!["• [A](https://a)", "• [Map Location](https://b)"]);
    }

    #[test]
    fn format_sources_none_when_nothing_usable() {
        let chunks = vec![
            GroundingChunk::default(),
            GroundingChunk {
                web: Some(GroundingLink::default()),
                maps: None,
            },
        ];
        assert_eq!(format_sources(&chunks), None);
        assert_eq!(format_sources(&[]), None);
    }

    #[test]
    fn unpaid_reply_records_fallback() {
        let history = Mutex::new(vec![ChatMessage::user("hi")]);
        drop(PendingReply::new(&history));
        let paid = PendingReply::new(&history).complete("ok".into());

        let history = history.into_inner().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].text, CHAT_FALLBACK_REPLY);
        assert_eq!(history[2], paid);
    }

    #[test]
    fn busy_guard_is_exclusive_and_resets() {
        let flag = AtomicBool::new(false);
        let guard = BusyGuard::acquire(&flag).unwrap();
        assert!(BusyGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(BusyGuard::acquire(&flag).is_some());
        assert!(!flag.load(Ordering::Acquire));
    }
}
