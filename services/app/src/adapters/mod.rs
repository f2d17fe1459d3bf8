pub mod blob;
pub mod db;
pub mod image;

pub use blob::BlobStore;
pub use db::SqliteStore;
pub use image::FileImageSource;
