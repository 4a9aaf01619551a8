pub use crate::errors::{Error, Result};
pub use crate::math::{Color, Vector2};
pub use crate::video::prelude::*;
