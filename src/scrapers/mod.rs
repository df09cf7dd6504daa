pub mod browser;
pub mod images;
pub mod traits;
pub mod types;

pub use browser::NjuskaloBrowserExtractor;
pub use images::ImageDownloader;
pub use traits::Extractor;
pub use types::SearchParams;
