//! XRay core: object trees, canonical entries and the normalization engine.
//! Nothing in here touches the network; secondary pages come in through
//! [`PageLoader`].
mod entry;
mod loader;
mod media_type;
mod normalize;
mod post_type;
mod tree;

pub mod sanitize;
pub mod text;
pub mod urls;
pub mod verify;

pub use entry::{
    Card, Entry, Event, Feed, HtmlValue, ItemEntry, Post, Product, Recipe, Refs, Repo, Review,
};
pub use loader::{MemoryLoader, OfflineLoader, PageLoader};
pub use media_type::MediaType;
pub use normalize::{parse_card, NormalizeOptions, Normalizer};
pub use post_type::{apply as apply_post_type, discover as discover_post_type, PostType};
pub use tree::{
    split_microformat_class, Item, ItemKind, ObjectTree, PlainValue, PropertyValue, RelUrl,
    RichText,
};
pub use verify::Verification;
