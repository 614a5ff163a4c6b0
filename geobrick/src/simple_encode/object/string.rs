use crate::{
    pdf::PdfString,
    simple_encode::SimpleEncoder,
    writer::{Encoder, Writer},
};

/// Marks every parenthesis without a partner. Only those need escaping, the
/// balanced ones can be written as they are.
fn unbalanced_parentheses(str: &[u8]) -> Vec<bool> {
    let mut unbalanced = vec![false; str.len()];
    let mut open = Vec::new();
    for (index, char) in str.iter().enumerate() {
        match char {
            b'(' => open.push(index),
            b')' => {
                if open.pop().is_none() {
                    unbalanced[index] = true;
                }
            }
            _ => {}
        }
    }
    for index in open {
        unbalanced[index] = true;
    }
    unbalanced
}

/// Text outside of ASCII is written as UTF-16BE with a byte order mark.
fn utf16_text(str: &PdfString) -> Option<Vec<u8>> {
    if str.is_ascii() {
        return None;
    }
    let text = std::str::from_utf8(str).ok()?;
    let mut bytes = vec![0xfe, 0xff];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Some(bytes)
}

impl Encoder<PdfString> for SimpleEncoder {
    fn write_to(str: &PdfString, writer: &mut dyn Writer) {
        if let Some(utf16) = utf16_text(str) {
            writer.write(b"<");
            writer.write(hex::encode_upper(utf16).as_bytes());
            writer.write(b">");
            return;
        }

        writer.write(&b"("[..]);
        let unbalanced = unbalanced_parentheses(str);
        let mut last_written_index = 0;
        for (index, char) in str.iter().enumerate() {
            if *char == b'\\' || unbalanced[index] {
                writer.write(&str[last_written_index..index]);
                writer.write(&br"\"[..]);
                last_written_index = index;
            }
        }
        writer.write(&str[last_written_index..]);
        writer.write(&b")"[..]);
    }
}

#[cfg(test)]
mod tests {
    use crate::{pdf::PdfString, simple_encode::SimpleEncoder, writer::Encoder};

    fn check(input: &[u8], expected: &[u8]) {
        let str = PdfString::from(input.to_vec());
        let encoded_len = SimpleEncoder::encoded_len(&str);
        let out = SimpleEncoder::to_vec(&str);
        assert_eq!(
            out,
            expected.to_vec(),
            "expected {} got {}",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(&out)
        );
        assert_eq!(encoded_len, out.len());
    }

    #[test]
    fn test_simple() {
        check(b"abcdefg", b"(abcdefg)");
    }

    #[test]
    fn test_end_with_closing_paranthesis() {
        check(b"(abcdefg)", b"((abcdefg))");
    }

    #[test]
    fn test_end_with_unmatched_closing_paranthesis() {
        check(b"abcdefg)", br"(abcdefg\))");
    }

    #[test]
    fn test_many_unmatched_closing_paranthesis() {
        check(b")))))))))", br"(\)\)\)\)\)\)\)\)\))");
    }

    #[test]
    fn test_many_unmatched_opening_paranthesis() {
        check(b"(((((((((", br"(\(\(\(\(\(\(\(\(\()");
    }

    #[test]
    fn test_many_matched_paranthesis() {
        check(b"((((((()))))))", b"(((((((())))))))");
    }

    #[test]
    fn test_many_unmatched_paranthesis() {
        check(b")))))(((((", br"(\)\)\)\)\)\(\(\(\(\()");
    }

    #[test]
    fn test_partly_matched_paranthesis() {
        check(b"(a(b)", br"(\(a(b))");
    }

    #[test]
    fn test_backslash() {
        check(br"C:\maps", br"(C:\\maps)");
    }

    #[test]
    fn test_utf16_text() {
        check("Zü".as_bytes(), b"<FEFF005A00FC>");
    }
}
