use crate::{pdf::Dictionary, simple_encode::SimpleEncoder, writer::Encoder};

impl Encoder<Dictionary> for SimpleEncoder {
    fn write_to(o: &Dictionary, writer: &mut dyn crate::writer::Writer) {
        writer.write(b"<< ");
        for (key, value) in o.iter() {
            Self::write_to(key, writer);
            writer.write(b" ");
            Self::write_to(value, writer);
            writer.write(b" ");
        }
        writer.write(b">>");
    }
}

#[cfg(test)]
mod tests {
    use crate::pdf::{dict, Object, ObjectId};

    use super::*;

    #[test]
    fn empty_dict() {
        let d = Dictionary::default();
        let expected_len = SimpleEncoder::encoded_len(&d);
        let expected_output = b"<< >>";
        assert_eq!(expected_len, expected_output.len());

        let mut out = Vec::new();
        SimpleEncoder::write_to(&d, &mut out);
        assert_eq!(expected_output, &out[..]);
    }

    #[test]
    fn filled_dict_keeps_order() {
        let mut d = Dictionary::default();
        d.insert(b"one".to_vec().into(), Object::Integer(1));
        d.insert(b"two".to_vec().into(), Object::Integer(2));
        d.insert(b"three".to_vec().into(), Object::Integer(3));

        let expected_output = b"<< /one 1 /two 2 /three 3 >>";
        let mut out = Vec::new();
        SimpleEncoder::write_to(&d, &mut out);
        assert_eq!(
            expected_output,
            &out[..],
            "expected: {} got: {}",
            String::from_utf8_lossy(expected_output),
            String::from_utf8_lossy(&out[..])
        );
        assert_eq!(out.len(), SimpleEncoder::encoded_len(&d));
    }

    #[test]
    fn nested_dict() {
        let d = dict([
            ("Type", Object::name("Page")),
            ("Parent", Object::Reference(ObjectId::new(1, 0))),
            ("Group", dict([("S", Object::name("Transparency"))]).into()),
        ]);
        assert_eq!(
            SimpleEncoder::to_vec(&d),
            b"<< /Type /Page /Parent 1 0 R /Group << /S /Transparency >> >>".to_vec()
        );
    }
}
