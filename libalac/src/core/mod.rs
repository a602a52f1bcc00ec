pub mod bitstream;
pub mod cookie;
pub mod error;
pub mod pcm;
pub mod rice;
pub mod types;

pub use bitstream::{BitReader, BitWriter};
pub use cookie::MagicCookie;
pub use error::{AlacError, AlacResult};
pub use pcm::{deinterleave, interleave, PcmSink, PcmSource, SliceSource};
pub use rice::{decode_residuals, encode_residuals, RiceParams};

pub use types::*;
