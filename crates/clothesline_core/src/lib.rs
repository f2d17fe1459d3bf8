pub mod browser;
pub mod domain;
pub mod feed;
pub mod ports;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use browser::CollectionBrowser;
pub use domain::{Collection, ImageOrigin, ImageState, NewOutfit, Outfit};
pub use feed::OutfitFeed;
pub use ports::{ImageSource, OutfitStore, PortError, PortResult};
pub use workflow::{ImageLoadOutcome, ImageRequest, OutfitEntry};
