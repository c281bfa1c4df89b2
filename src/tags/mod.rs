pub mod library;
pub mod matcher;

pub use library::FeatureIndex;
pub use library::Tag;
pub use library::TagLibrary;
pub use library::UNMAPPED_TAG;

pub use matcher::MatchParams;
pub use matcher::TagMatch;
pub use matcher::TagMatcher;
