//! ColorShift — load an image, apply one pixel transform, save the result.
//!
//! The engine lives in [`ops`]; [`io`], [`session`], [`settings`], [`cli`]
//! and [`menu`] are the thin layers that feed it.

pub mod cli;
pub mod io;
pub mod logger;
pub mod menu;
pub mod ops;
pub mod raster;
pub mod session;
pub mod settings;

pub use ops::{
    Channel, Color, KernelKind, Preset, TransformError, TransformParameters, apply,
};
pub use raster::Raster;
pub use session::Session;
