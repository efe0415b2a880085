const BYTES_PER_LINE: usize = 16;
const MAX_DUMP_BYTES: usize = 256;

/// Formats bytes as offset-prefixed hex lines for diagnostics. Long inputs are cut short.
pub fn hexdump(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(MAX_DUMP_BYTES)];
    let mut out = String::new();
    for (line, chunk) in shown.chunks(BYTES_PER_LINE).enumerate() {
        let text: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect();
        out.push_str(&format!(
            "{:04x}  {:<32}  {}\n",
            line * BYTES_PER_LINE,
            hex::encode(chunk),
            text
        ));
    }
    if bytes.len() > shown.len() {
        out.push_str(&format!("... {} more bytes\n", bytes.len() - shown.len()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_offset_hex_and_text() {
        let dump = hexdump(b"AB\x00");
        assert!(dump.starts_with("0000  414200"));
        assert!(dump.trim_end().ends_with("AB."));
    }

    #[test]
    fn truncates_long_input() {
        let dump = hexdump(&[0u8; 300]);
        assert_eq!(dump.lines().count(), 17);
        assert!(dump.contains("44 more bytes"));
    }
}
