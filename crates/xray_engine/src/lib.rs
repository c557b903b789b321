//! XRay engine: fetching, format detection and the readers for each format.
mod decode;
mod fetch;
mod loader;
mod options;
mod parser;
mod types;
mod xray;

pub mod adapters;
pub mod mf2;

pub use adapters::activity::{is_activity_streams, ActivityParser, ObjectResolver};
pub use adapters::{AdapterOutput, AdapterRegistry, SiteAdapter};
pub use decode::{decode_body, DecodeError, DecodedBody};
pub use fetch::{validate_url, AcceptMode, FetchRequest, FetchSettings, Fetcher, ReqwestFetcher};
pub use mf2::{parse_html, parse_page, ParsedHtml};
pub use options::{Expect, ParseOptions};
pub use types::{
    DataRels, Envelope, EnvelopeData, ErrorEnvelope, FailureKind, FetchError, Info, RawDocument,
    SourceFormat, XrayError,
};
pub use xray::XRay;
