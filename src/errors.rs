use crate::video::assets::prelude::{ShaderHandle, ShaderStage, TextureHandle};
use crate::video::backends::FramebufferStatus;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Failed to create graphics context: {}.", _0)]
    ContextCreation(String),
    #[fail(display = "Failed to compile {:?} shader, errors: \n{}.", _0, _1)]
    ShaderCompile(ShaderStage, String),
    #[fail(display = "Failed to link shader program, errors: \n{}.", _0)]
    ShaderLink(String),
    #[fail(display = "Texture is not valid, it does not carry an uid.")]
    InvalidTexture,
    #[fail(display = "Framebuffer '{}' is incomplete ({:?}).", _0, _1)]
    FramebufferIncomplete(String, FramebufferStatus),
    #[fail(display = "{} is invalid.", _0)]
    ShaderHandleInvalid(ShaderHandle),
    #[fail(display = "{} is invalid.", _0)]
    TextureHandleInvalid(TextureHandle),
    #[fail(display = "Framebuffer '{}' does not exist.", _0)]
    FramebufferNotExists(String),
    #[fail(display = "Geometry {} has no GPU buffers yet.", _0)]
    GeometryNotPrepared(uuid::Uuid),
    #[fail(display = "No shader is bound.")]
    NoShaderBound,
    #[fail(display = "Bitmap of {}x{} needs {} bytes, but {} were supplied.", _0, _1, _2, _3)]
    InvalidBitmap(u32, u32, usize, usize),
    #[fail(display = "Backend: {}", _0)]
    Backend(String),
    #[fail(display = "Config: {}", _0)]
    Config(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Config(format!("{}", err))
    }
}

macro_rules! backend_err {
    ($e:expr) => {
        $crate::errors::Error::Backend(String::from($e))
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::Backend(format!($fmt, $($arg)+))
    };
}
