pub use crate::extensions::Extension;
pub use crate::models::{ChapterInfo, Input, InputType, Lang, MangaInfo, SourceInfo};
