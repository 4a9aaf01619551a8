//! # Tincture
//!
//! A small GPU resource and draw layer for image post-processing. It owns the
//! lifecycle of shader programs, textures, vertex buffers and multisampled
//! framebuffers on top of a thin `Device` seam with OpenGL, WebGL and headless
//! backends.
//!
//! Most programs only need the `prelude`:
//!
//! ```rust,ignore
//! use tincture::prelude::*;
//!
//! let mut flat = FlatRenderer::new(HeadlessSurface::new(4, 4), ContextOptions::default())?;
//! flat.set_image(Bitmap::solid(1, 1, [255, 255, 255, 255]));
//! flat.draw()?;
//! assert_eq!(flat.read_pixel(0, 0)?, [255, 255, 255, 255]);
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

#[macro_use]
pub mod errors;
#[macro_use]
pub mod utils;
pub mod math;
pub mod video;

pub mod prelude;
