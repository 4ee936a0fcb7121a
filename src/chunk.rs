/// Telegram caps messages at 4096 chars; leave headroom for entity expansion.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 3500;

/// Split text on line boundaries into chunks of at most `max_len` chars.
///
/// Lines are never cut, so a single line longer than `max_len` becomes its own
/// oversized chunk. Joining the result with `\n` gives back the input.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0usize;
    let mut started = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if !started {
            buf.push_str(line);
            buf_len = line_len;
            started = true;
        } else if buf_len + 1 + line_len > max_len {
            chunks.push(std::mem::take(&mut buf));
            buf.push_str(line);
            buf_len = line_len;
        } else {
            buf.push('\n');
            buf.push_str(line);
            buf_len += 1 + line_len;
        }
    }
    chunks.push(buf);

    chunks
}
