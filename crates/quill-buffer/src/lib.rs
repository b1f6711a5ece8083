//! # Quill Buffer
//!
//! The document model of the quill editing engine: an ordered sequence of
//! lines stored in a rope, the edit operations that mutate it, and the
//! undo/redo history built from their inverses.
//!
//! ## Key Concepts for Learning Rust
//!
//! ### Ownership & Borrowing
//! - `TextBuffer` owns the rope and the history
//! - Methods like `line()` return borrowed data (`Cow<str>`)
//! - Mutations require `&mut self` (exclusive access)
//!
//! ### Memory Safety
//! - Positions handed to the buffer are clamped, never trusted
//! - Views share a buffer through `Rc<RefCell<TextBuffer>>`

mod buffer;
mod history;
mod observer;
mod position;
mod range;
pub mod word;

pub use buffer::{BufferConfig, BufferEvent, ContentChange, SharedBuffer, TextBuffer};
pub use history::{EditGroup, EditKind, EditOperation, History, HistoryEntry, split_lines};
pub use observer::{Observers, SubscriptionId};
pub use position::TextPosition;
pub use range::TextRange;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("Buffer is read-only")]
    ReadOnly,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

/// Identifies who requested an edit, so a view can tell its own edits
/// from edits made through another view of the same buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Creates a new unique actor ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a motion or search step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    /// The opposite direction.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}
