use crate::{pdf::Array, simple_encode::SimpleEncoder, writer::Encoder};

impl Encoder<Array> for SimpleEncoder {
    fn write_to(array: &Array, writer: &mut dyn crate::writer::Writer) {
        writer.write(b"[ ");
        for item in array.iter() {
            Self::write_to(item, writer);
            writer.write(b" ");
        }
        writer.write(b"]");
    }
}
