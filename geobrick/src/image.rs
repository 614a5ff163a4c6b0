//! Pixel level helpers for image XObjects.

pub use self::{
    encoder::{BlockImage, EncoderOptions, EncoderRegistry, ImageEncoder, JpegEncoder},
    mask::Mask,
    predictor::horizontal_difference,
};

mod encoder;
mod mask;
mod predictor;
