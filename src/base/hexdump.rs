//! Classic 16-bytes-per-line hex dumps.
//!
//! ```text
//! 47 45 54 20 2f 20 48 54 54 50 2f 31 2e 31 0d 0a GET / HTTP/1.1..
//! 0a                                              .
//! ```
//!
//! Every line is 64 characters: 16 `xx ` groups followed by 16 ASCII columns.
//! A short last line is padded with spaces in both halves.

use std::io::{self, Write};

use tracing::Level;

const DIGITS: &[u8; 16] = b"0123456789abcdef";
const BYTES_PER_LINE: usize = 16;
const LINE_LEN: usize = BYTES_PER_LINE * 3 + BYTES_PER_LINE;

/// Iterate the dump one line at a time, without trailing newlines.
pub fn hex_dump_lines(bytes: &[u8]) -> impl Iterator<Item = String> + '_ {
    bytes.chunks(BYTES_PER_LINE).map(format_line)
}

/// Write the dump, one `\n`-terminated line per 16 bytes.
pub fn hex_dump_to_writer<W: Write + ?Sized>(bytes: &[u8], w: &mut W) -> io::Result<()> {
    for line in hex_dump_lines(bytes) {
        writeln!(w, "{}", line)?;
    }
    Ok(())
}

/// The whole dump as a string.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() / BYTES_PER_LINE + 1) * (LINE_LEN + 1));
    for line in hex_dump_lines(bytes) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Emit each line of the dump as a tracing event at `level`.
pub fn hex_dump_to_log(bytes: &[u8], level: Level) {
    for line in hex_dump_lines(bytes) {
        match level {
            Level::TRACE => tracing::trace!("{}", line),
            Level::DEBUG => tracing::debug!("{}", line),
            Level::INFO => tracing::info!("{}", line),
            Level::WARN => tracing::warn!("{}", line),
            Level::ERROR => tracing::error!("{}", line),
        }
    }
}

fn format_line(chunk: &[u8]) -> String {
    let mut line = [b' '; LINE_LEN];
    for (j, &d) in chunk.iter().enumerate() {
        line[j * 3] = DIGITS[(d >> 4) as usize];
        line[j * 3 + 1] = DIGITS[(d & 15) as usize];
        line[BYTES_PER_LINE * 3 + j] = if (32..=127).contains(&d) { d } else { b'.' };
    }
    // Every byte written is ASCII.
    String::from_utf8_lossy(&line).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_line() {
        let lines: Vec<String> = hex_dump_lines(b"GET / HTTP/1.1\r\n").collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            "47 45 54 20 2f 20 48 54 54 50 2f 31 2e 31 0d 0a GET / HTTP/1.1.."
        );
    }

    #[test]
    fn short_line_is_padded() {
        let lines: Vec<String> = hex_dump_lines(&[0x00, 0x41, 0xff]).collect();
        assert_eq!(lines[0].len(), LINE_LEN);
        assert!(lines[0].starts_with("00 41 ff "));
        assert_eq!(&lines[0][48..], ".A.             ");
    }

    #[test]
    fn multiple_lines_and_remainder() {
        let bytes: Vec<u8> = (0u8..20).collect();
        let dump = hex_dump(&bytes);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("10 11 12 13 "));
        assert!(lines.iter().all(|l| l.len() == LINE_LEN));
    }

    #[test]
    fn empty_input_has_no_lines() {
        assert_eq!(hex_dump_lines(&[]).count(), 0);
        let mut out = Vec::new();
        hex_dump_to_writer(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn writer_output_matches_string() {
        let bytes = b"the quick brown fox jumps";
        let mut out = Vec::new();
        hex_dump_to_writer(bytes, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), hex_dump(bytes));
    }

    #[test]
    fn del_counts_as_printable() {
        let lines: Vec<String> = hex_dump_lines(&[0x7f, 0x1f]).collect();
        assert_eq!(lines[0].as_bytes()[48], 0x7f);
        assert_eq!(lines[0].as_bytes()[49], b'.');
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_emits_one_event_per_line_at_level() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            hex_dump_to_log(&[b'A'; 20], Level::DEBUG);
            // Filtered out by the subscriber.
            hex_dump_to_log(b"x", Level::TRACE);
        });

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2, "{out}");
        assert!(lines.iter().all(|l| l.contains("DEBUG")));
        assert!(lines[0].trim_end().ends_with("AAAAAAAAAAAAAAAA"));
        assert!(lines[1].contains("41 41 41 41"));
    }
}
