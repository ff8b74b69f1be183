pub mod resume;
pub mod search;

pub use resume::{ExperienceEntry, ResumeRecord};
pub use search::SearchQuery;
