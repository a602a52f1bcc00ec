//! Lossless ALAC coding
//!
//! Adaptive integer LPC with rice-coded residuals, optional stereo
//! decorrelation, and an uncompressed fallback for frames that don't fit.

pub mod correlate;
pub mod decoder;
pub mod encoder;
pub mod estimator;
pub mod lpc;

pub use correlate::{correlate, decorrelate};
pub use estimator::{
    autocorrelate, compute_lp_coefficients, quantize_coefficients, tukey_window, window_signal,
    CoefficientEstimator, Estimate,
};
pub use lpc::{adapt_coefficients, calculate_residuals, reconstruct_samples, sign_extend};

pub use decoder::Decoder;
pub use encoder::{EncodedStream, Encoder, EncoderOptions, MDAT_HEADER_SIZE};
