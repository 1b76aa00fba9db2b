pub mod commands;
pub mod comment;
pub mod shared_str;
pub mod types;

pub use commands::RenderCommand;
pub use comment::{Comment, CommentKind, ScrollDirection};
pub use shared_str::SharedStr;
pub use types::{Color, Point, Viewport};
