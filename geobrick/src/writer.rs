/// Byte sink for the encoders.
pub trait Writer {
    fn write(&mut self, buf: &[u8]);
}

impl Writer for Vec<u8> {
    fn write(&mut self, buf: &[u8]) {
        self.extend_from_slice(buf);
    }
}

/// Discards everything but the number of bytes.
#[derive(Debug, Default)]
struct LenCounter(usize);

impl Writer for LenCounter {
    fn write(&mut self, buf: &[u8]) {
        self.0 += buf.len();
    }
}

pub trait Encoder<T: ?Sized> {
    fn write_to(obj: &T, writer: &mut dyn Writer);

    fn encoded_len(obj: &T) -> usize {
        let mut counter = LenCounter::default();
        Self::write_to(obj, &mut counter);
        counter.0
    }

    fn to_vec(obj: &T) -> Vec<u8> {
        let mut out = Vec::new();
        Self::write_to(obj, &mut out);
        out
    }
}
