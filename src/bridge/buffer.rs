use tokio::sync::watch;

/// The text of the note open in one tab.
///
/// Readers such as the autosave timer hold a `watch::Receiver` and always see
/// the latest value.
#[derive(Debug)]
pub struct EditingBuffer {
    content: watch::Sender<String>,
}

impl EditingBuffer {
    pub fn new(initial: impl Into<String>) -> Self {
        let (content, _rx) = watch::channel(initial.into());
        Self { content }
    }

    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    pub fn replace(&self, text: impl Into<String>) {
        self.content.send_replace(text.into());
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.content.subscribe()
    }
}

impl Default for EditingBuffer {
    fn default() -> Self {
        Self::new(String::new())
    }
}
