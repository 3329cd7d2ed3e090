//! Custom extractors.

mod messages;

pub use messages::{FlashLevel, FlashMessage, Messages};
