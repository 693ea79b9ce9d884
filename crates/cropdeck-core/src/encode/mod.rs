//! Export encoding.
//!
//! Every export is normalized to JPEG regardless of the source format.
//!
//! # Examples
//!
//! ```ignore
//! use cropdeck_core::encode::write_jpeg;
//!
//! write_jpeg(&crop, Path::new("save_image/cat.jpg"), 98)?;
//! ```

mod jpeg;

pub use jpeg::{encode_jpeg, write_jpeg, EncodeError};
