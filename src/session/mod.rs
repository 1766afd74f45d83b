pub mod webdriver;

use scraper::Html;
use serde_json::Value;
use thiserror::Error;

pub use webdriver::WebDriverSession;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The scroll target has run past the end of its content.
    #[error("scroll target out of bounds")]
    OutOfBounds,
    #[error("script failed ({code}): {message}")]
    Script { code: String, message: String },
    #[error("session transport error: {0}")]
    Transport(String),
}

/// Narrow view of a live browser session: the engine only ever re-reads the
/// current page and runs scripts against it.
pub trait Session {
    fn page_source(&mut self) -> Result<String, SessionError>;
    fn execute_script(&mut self, script: &str) -> Result<Value, SessionError>;
}

/// Parse the session's current page into a fresh snapshot.
pub fn snapshot(session: &mut dyn Session) -> Result<Html, SessionError> {
    let source = session.page_source()?;
    Ok(Html::parse_document(&source))
}

/// Offline session over saved page sources. Pages are served in order and
/// the last one repeats; scripts are accepted and ignored.
pub struct StaticSession {
    pages: Vec<String>,
    served: usize,
    scripts: Vec<String>,
}

impl StaticSession {
    pub fn new(page: impl Into<String>) -> Self {
        Self::from_pages(vec![page.into()])
    }

    pub fn from_pages(pages: Vec<String>) -> Self {
        Self {
            pages,
            served: 0,
            scripts: Vec::new(),
        }
    }

    /// Scripts received so far, oldest first.
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }
}

impl Session for StaticSession {
    fn page_source(&mut self) -> Result<String, SessionError> {
        let idx = self.served.min(self.pages.len().saturating_sub(1));
        let page = self
            .pages
            .get(idx)
            .cloned()
            .ok_or_else(|| SessionError::Transport("no page loaded".to_string()))?;
        self.served += 1;
        Ok(page)
    }

    fn execute_script(&mut self, script: &str) -> Result<Value, SessionError> {
        self.scripts.push(script.to_string());
        Ok(Value::Null)
    }
}
