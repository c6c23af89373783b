// Comment-batch sentiment aggregation
pub mod scorer;

pub use scorer::{classify, score_comments, Polarity};
