use crate::{
    parse::object::{FALSE_OBJECT, NULL_OBJECT, TRUE_OBJECT},
    pdf::{Object, ObjectId},
    writer::{Encoder, Writer},
};

use super::SimpleEncoder;

pub(crate) mod array;
pub(crate) mod dictionary;
pub(crate) mod name;
pub(crate) mod string;

/// Integral values are written without a fractional part, everything else in
/// the shortest form that reads back to the same value. PDF has no exponent
/// notation, which `f64`'s `Display` never produces.
pub(crate) fn format_real(value: f64) -> String {
    if !value.is_finite() {
        log::warn!("non finite real {} written as 0", value);
        return "0".to_owned();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl Encoder<ObjectId> for SimpleEncoder {
    fn write_to(r: &ObjectId, writer: &mut dyn Writer) {
        writer.write(r.number.to_string().as_bytes());
        writer.write(b" ");
        writer.write(r.generation.to_string().as_bytes());
        writer.write(b" R");
    }
}

impl Encoder<Object> for SimpleEncoder {
    fn write_to(obj: &Object, writer: &mut dyn Writer) {
        match obj {
            Object::String(str) => Self::write_to(str, writer),
            Object::HexString(bytes) => {
                writer.write(b"<");
                writer.write(hex::encode_upper(&bytes[..]).as_bytes());
                writer.write(b">");
            }
            Object::Real { value, as_string: false } => writer.write(format_real(*value).as_bytes()),
            Object::Real { value, as_string: true } => {
                writer.write(b"(");
                writer.write(format_real(*value).as_bytes());
                writer.write(b")");
            }
            Object::Integer(i) => writer.write(i.to_string().as_bytes()),
            Object::Bool(true) => writer.write(TRUE_OBJECT.as_bytes()),
            Object::Bool(false) => writer.write(FALSE_OBJECT.as_bytes()),
            Object::Name(n) => Self::write_to(n, writer),
            Object::Array(a) => Self::write_to(a, writer),
            Object::Dictionary(d) => Self::write_to(d, writer),
            Object::Null => writer.write(NULL_OBJECT.as_bytes()),
            Object::Reference(r) => Self::write_to(r, writer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::Bytes;

    fn encode(obj: Object) -> String {
        String::from_utf8(SimpleEncoder::to_vec(&obj)).unwrap()
    }

    #[test]
    fn reals() {
        assert_eq!(encode(Object::from(72.0)), "72");
        assert_eq!(encode(Object::from(-0.5)), "-0.5");
        assert_eq!(encode(Object::from(0.1 + 0.2)), "0.30000000000000004");
        assert_eq!(encode(Object::from(1e-7)), "0.0000001");
        assert_eq!(encode(Object::precise(2.0)), "(2)");
        assert_eq!(encode(Object::precise(500000.125)), "(500000.125)");
        assert_eq!(encode(Object::from(f64::NAN)), "0");
    }

    #[test]
    fn scalars() {
        assert_eq!(encode(Object::Integer(-12)), "-12");
        assert_eq!(encode(Object::Bool(true)), "true");
        assert_eq!(encode(Object::Null), "null");
        assert_eq!(encode(Object::Reference(ObjectId::new(12, 3))), "12 3 R");
        assert_eq!(encode(Object::HexString(Bytes::from(vec![0xfe, 0xff, 0x00]))), "<FEFF00>");
    }

    #[test]
    fn encoded_len_matches_output() {
        let obj = Object::from(vec![Object::name("Indexed"), Object::text("a(b"), Object::from(1.25)]);
        assert_eq!(SimpleEncoder::encoded_len(&obj), SimpleEncoder::to_vec(&obj).len());
    }
}
