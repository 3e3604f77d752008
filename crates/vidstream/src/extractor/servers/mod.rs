//! Per-site embed extractors dispatched off the server list.

pub mod mp4upload;
pub mod xstreamcdn;

pub use mp4upload::Mp4Upload;
pub use xstreamcdn::XStreamCdn;
