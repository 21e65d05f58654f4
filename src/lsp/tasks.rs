use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DocumentTaskKind {
    Completion,
    Hover,
}

/// Per-document generation counters. Taking a new token for a kind
/// supersedes every token handed out before it, which is how a fresh
/// keystroke cancels the completion build of the previous one.
#[derive(Debug, Default)]
pub struct DocumentTaskState {
    completion: Arc<TaskGeneration>,
    hover: Arc<TaskGeneration>,
}

impl DocumentTaskState {
    pub fn token(&self, kind: DocumentTaskKind) -> DocumentTaskToken {
        let slot = self.slot(kind);
        DocumentTaskToken::new(kind, Arc::clone(slot))
    }

    /// Invalidate all outstanding tokens, e.g. when the document changes.
    pub fn cancel_all(&self) {
        self.completion.cancel();
        self.hover.cancel();
    }

    fn slot(&self, kind: DocumentTaskKind) -> &Arc<TaskGeneration> {
        match kind {
            DocumentTaskKind::Completion => &self.completion,
            DocumentTaskKind::Hover => &self.hover,
        }
    }
}

#[derive(Debug, Default)]
struct TaskGeneration {
    generation: AtomicU64,
}

impl TaskGeneration {
    fn next_token(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_cancelled(&self, expected: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != expected
    }

    fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct DocumentTaskToken {
    kind: DocumentTaskKind,
    state: Arc<TaskGeneration>,
    generation: u64,
}

impl DocumentTaskToken {
    fn new(kind: DocumentTaskKind, state: Arc<TaskGeneration>) -> Self {
        let generation = state.next_token();
        Self {
            kind,
            state,
            generation,
        }
    }

    pub fn kind(&self) -> DocumentTaskKind {
        self.kind
    }

    pub fn ensure_active(&self) -> Result<(), DocumentTaskCancelled> {
        if self.is_cancelled() {
            Err(DocumentTaskCancelled { kind: self.kind })
        } else {
            Ok(())
        }
    }

    /// Yield to the runtime, then check whether this token still owns the
    /// latest generation.
    pub async fn yield_and_check(&self) -> Result<(), DocumentTaskCancelled> {
        tokio::task::yield_now().await;
        self.ensure_active()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled(self.generation)
    }

    pub fn cancel(&self) {
        self.state.cancel();
    }
}

#[derive(Debug)]
pub struct DocumentTaskCancelled {
    kind: DocumentTaskKind,
}

impl fmt::Display for DocumentTaskCancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} task cancelled", self.kind)
    }
}

impl std::error::Error for DocumentTaskCancelled {}
