/// Soft mask derived from an alpha band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mask {
    /// Every sample is 255, no mask is needed.
    Opaque,
    /// Only 0 and 255 occur: one bit per pixel, rows padded to whole bytes,
    /// most significant bit first.
    Bitmap(Vec<u8>),
    /// 8 bit gray mask.
    Gray(Vec<u8>),
}

impl Mask {
    /// Classify the `width` x `height` alpha samples and pack them if
    /// possible.
    pub fn from_alpha(alpha: Vec<u8>, width: usize, height: usize) -> Self {
        debug_assert_eq!(alpha.len(), width * height);
        if alpha.iter().all(|&a| a == 255) {
            return Mask::Opaque;
        }
        if !alpha.iter().all(|&a| a == 0 || a == 255) {
            return Mask::Gray(alpha);
        }

        let row_len = (width + 7) / 8;
        let mut packed = vec![0u8; row_len * height];
        if width > 0 {
            for (src, dst) in alpha.chunks_exact(width).zip(packed.chunks_exact_mut(row_len)) {
                for (x, _) in src.iter().enumerate().filter(|(_, a)| **a != 0) {
                    dst[x / 8] |= 1 << (7 - (x % 8));
                }
            }
        }
        Mask::Bitmap(packed)
    }

    pub fn bits_per_component(&self) -> u8 {
        match self {
            Mask::Bitmap(_) => 1,
            _ => 8,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Mask::Opaque => &[],
            Mask::Bitmap(data) | Mask::Gray(data) => data,
        }
    }
}
