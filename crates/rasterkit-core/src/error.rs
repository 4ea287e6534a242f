use thiserror::Error;

/// Closed taxonomy for everything that can go wrong below the script-host boundary.
///
/// Every variant here is a validation failure detected synchronously by the operation
/// that noticed it; nothing here is retried by the core itself.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown format tag or fourcc: {0}")]
    FormatUnknown(String),

    #[error("channel mismatch: left has {left} channels, right has {right}")]
    ChannelMismatch { left: usize, right: usize },

    #[error("size mismatch: left is {left_w}x{left_h}, right is {right_w}x{right_h}")]
    SizeMismatch {
        left_w: u32,
        left_h: u32,
        right_w: u32,
        right_h: u32,
    },

    #[error("mip chain invalid at level {level}: expected {expected_w}x{expected_h}, got {got_w}x{got_h}")]
    MipChainInvalid {
        level: usize,
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },

    #[error("cube shape invalid: faces must be square and share dimensions, face {face} is {w}x{h}")]
    CubeShapeInvalid { face: usize, w: u32, h: u32 },

    #[error("bad dds header: {0}")]
    BadHeader(String),

    #[error("unsupported dds header feature: {0}")]
    UnsupportedHeader(String),

    #[error("convolution kernel shape invalid: {0}")]
    KernelShape(String),

    #[error("index out of range: ({x}, {y}) not within {width}x{height}")]
    IndexOutOfRange { x: i64, y: i64, width: u32, height: u32 },

    #[error("io error reading/writing {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
