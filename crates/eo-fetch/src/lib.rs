//! Fetching remote imagery into patches.
//!
//! [`FetchTask`] resolves acquisition times through a [`SceneCatalog`],
//! posts one processing-API request per scene through a [`DownloadClient`],
//! and writes the decoded bands, masks and metadata into an
//! [`eo_patch::Patch`]. Both collaborators are traits; the vendor protocol
//! stays behind them.

pub mod client;
pub mod error;
pub mod evalscript;
pub mod request;
pub mod task;

pub use client::{
    DownloadClient, DownloadRequest, HttpDownloadClient, MimeType, ResponseBundle,
    ResponseDecoder, ResponsePart, SceneCatalog,
};
pub use error::{FetchError, Result};
pub use request::{classify_band, BandClass, MosaickingOrder, ResponseSpec};
pub use task::{AdditionalData, FetchConfig, FetchTask};
