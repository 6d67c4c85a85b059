const fn get_replacements() -> [u8; 256] {
    // Only ASCII bytes are escaped, multi-byte utf-8 sequences pass through untouched.
    let mut result = [0u8; 256];
    let mut i = 0;
    while i < 0x20 {
        result[i] = b'u';
        i += 1;
    }
    result[b'"' as usize] = b'"';
    result[b'\\' as usize] = b'\\';
    result[8] = b'b';
    result[0xc] = b'f';
    result[b'\n' as usize] = b'n';
    result[b'\r' as usize] = b'r';
    result[b'\t' as usize] = b't';

    result
}

static REPLACEMENTS: [u8; 256] = get_replacements();
static HEX: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F',
];

/// Appends `input` as a quoted JSON string.
#[inline]
pub fn write_and_escape_string(output_buffer: &mut String, input: &str) {
    output_buffer.push('"');

    let bytes = input.as_bytes();
    let mut written = 0;
    for (index, byte) in bytes.iter().enumerate() {
        let replacement = REPLACEMENTS[*byte as usize];
        if replacement == 0 {
            continue;
        }

        output_buffer.push_str(&input[written..index]);
        if replacement == b'u' {
            output_buffer.push_str("\\u00");
            output_buffer.push(HEX[((byte / 16) & 0xF) as usize]);
            output_buffer.push(HEX[(byte & 0xF) as usize]);
        } else {
            output_buffer.push('\\');
            output_buffer.push(replacement as char);
        }
        written = index + 1;
    }
    output_buffer.push_str(&input[written..]);

    output_buffer.push('"');
}

/// Appends `"key":`.
#[inline]
pub fn write_key(output_buffer: &mut String, key: &str) {
    write_and_escape_string(output_buffer, key);
    output_buffer.push(':');
}

#[cfg(test)]
mod tests {
    use super::write_and_escape_string;

    #[test]
    fn escapes_quotes_and_control_characters() {
        let mut out = String::new();
        write_and_escape_string(&mut out, "{user(id: \"1\")\n\u{1}ü}");
        insta::assert_snapshot!(out, @r#""{user(id: \"1\")\n\u0001ü}""#);
    }
}
