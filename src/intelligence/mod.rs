pub mod board;
pub mod dedup;
pub mod ranker;

pub use board::WhaleBoard;
pub use dedup::{filter_new, SeenSet};
pub use ranker::select;
