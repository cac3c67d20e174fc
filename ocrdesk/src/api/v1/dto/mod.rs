mod extractions;
mod history;
mod languages;
mod sessions;

pub use extractions::*;
pub use history::*;
pub use languages::*;
pub use sessions::*;
