use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    Info,
    Reshuffled,
    NoMoreCards,
    AtStart,
    NoGamesSelected,
    NoCardsOfType,
    InsufficientForRuleset,
    InvalidState,
    InvalidIndex,
    UnknownAction,
    NoCandidates,
    CatalogLoadFailure,
    PersistenceFailure,
}

/// A structured message for the host to display; the core never renders anything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct NoticeLog {
    queue: Vec<Notice>,
}

impl NoticeLog {
    pub fn push(&mut self, notice: Notice) {
        self.queue.push(notice);
    }

    pub fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.push(Notice::new(kind, message));
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Notice> + '_ {
        self.queue.drain(..)
    }

    pub fn contains(&self, kind: NoticeKind) -> bool {
        self.queue.iter().any(|notice| notice.kind == kind)
    }
}
