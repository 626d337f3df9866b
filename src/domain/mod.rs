pub mod enums;
pub mod todo;

pub use enums::{ListSurface, TimerStatus, UiMode};
pub use todo::{ListGroup, Project, TimerContext, Todo, MAX_PROJECT_NAME, MAX_TODO_TEXT};
