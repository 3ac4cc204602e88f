use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("payload: encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("payload: decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("payload: invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("payload: unrecognized format")]
    Unrecognized,
}

pub type Result<T> = std::result::Result<T, Error>;
