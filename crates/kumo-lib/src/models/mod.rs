pub mod source_info;
pub use source_info::*;

pub mod manga_info;
pub use manga_info::*;

pub mod chapter_info;
pub use chapter_info::*;

pub mod input;
pub use input::*;
