pub mod session;
pub mod store;
pub mod types;

pub use session::{BackgroundUpdates, MoodError, Session};
pub use store::ConversationStore;
pub use types::{MemoryItem, MemoryKind, MoodEntry, Role, Task, TaskOrigin, TaskStatus, Turn};
