pub mod structs;
pub mod fetcher;
pub mod text_serializer;

pub use structs::Quote;
pub use fetcher::{FeedKind, PriceFeed};
