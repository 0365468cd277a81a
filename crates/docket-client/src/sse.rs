//! Incremental parser for `text/event-stream` bytes.

/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
  /// The `event:` field, if the frame carried one.
  pub event: Option<String>,
  /// All `data:` lines of the frame, joined with `\n`.
  pub data:  String,
}

/// Reassembles SSE frames from arbitrarily-chunked bytes.
///
/// Frames are separated by a blank line; within a frame, `event:` names
/// the event and each `data:` line contributes one line of the payload.
/// Comment lines (leading `:`, used as keep-alive pings) and fields the
/// feed does not use (`id:`, `retry:`) are skipped. A frame with no data
/// is not emitted.
#[derive(Debug, Default)]
pub struct FrameParser {
  buffer: String,
  event:  Option<String>,
  data:   Vec<String>,
}

impl FrameParser {
  /// Feed a chunk; returns every frame the chunk completed.
  pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
    self.buffer.push_str(&String::from_utf8_lossy(chunk));

    let mut frames = Vec::new();
    while let Some(newline) = self.buffer.find('\n') {
      let line: String = self.buffer.drain(..=newline).collect();
      let line = line.trim_end_matches(['\n', '\r']);

      if line.is_empty() {
        if let Some(frame) = self.take_frame() {
          frames.push(frame);
        }
      } else if let Some(rest) = line.strip_prefix("data:") {
        self.data.push(trim_field(rest).to_string());
      } else if let Some(rest) = line.strip_prefix("event:") {
        self.event = Some(trim_field(rest).to_string());
      }
    }
    frames
  }

  fn take_frame(&mut self) -> Option<Frame> {
    let event = self.event.take();
    if self.data.is_empty() {
      return None;
    }
    let data = std::mem::take(&mut self.data).join("\n");
    Some(Frame { event, data })
  }
}

/// Field values may carry one leading space after the colon.
fn trim_field(value: &str) -> &str {
  value.strip_prefix(' ').unwrap_or(value)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frame(event: Option<&str>, data: &str) -> Frame {
    Frame {
      event: event.map(str::to_string),
      data:  data.to_string(),
    }
  }

  #[test]
  fn one_frame_in_one_chunk() {
    let mut parser = FrameParser::default();
    let frames = parser.push(b"event: profile\ndata: {\"x\":1}\n\n");
    assert_eq!(frames, vec![frame(Some("profile"), "{\"x\":1}")]);
  }

  #[test]
  fn frame_split_across_chunks() {
    let mut parser = FrameParser::default();
    assert!(parser.push(b"event: noti").is_empty());
    assert!(parser.push(b"ce\ndata: {}").is_empty());
    let frames = parser.push(b"\n\n");
    assert_eq!(frames, vec![frame(Some("notice"), "{}")]);
  }

  #[test]
  fn two_frames_in_one_chunk() {
    let mut parser = FrameParser::default();
    let frames = parser.push(b"data: a\n\ndata: b\n\n");
    assert_eq!(frames, vec![frame(None, "a"), frame(None, "b")]);
  }

  #[test]
  fn keep_alive_comments_produce_nothing() {
    let mut parser = FrameParser::default();
    assert!(parser.push(b":\n\n: ping\n\n").is_empty());
  }

  #[test]
  fn multi_line_data_is_joined() {
    let mut parser = FrameParser::default();
    let frames = parser.push(b"data: line one\ndata: line two\n\n");
    assert_eq!(frames, vec![frame(None, "line one\nline two")]);
  }

  #[test]
  fn crlf_line_endings_are_accepted() {
    let mut parser = FrameParser::default();
    let frames = parser.push(b"event: profile\r\ndata: {}\r\n\r\n");
    assert_eq!(frames, vec![frame(Some("profile"), "{}")]);
  }

  #[test]
  fn event_name_does_not_leak_into_the_next_frame() {
    let mut parser = FrameParser::default();
    let frames = parser.push(b"event: profile\ndata: a\n\ndata: b\n\n");
    assert_eq!(
      frames,
      vec![frame(Some("profile"), "a"), frame(None, "b")]
    );
  }
}
