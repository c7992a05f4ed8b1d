//! Incremental `text/event-stream` decoder and the match-assignment payload.
//!
//! Chunks from the HTTP body can split lines, and even UTF-8 sequences,
//! anywhere; the decoder buffers raw bytes and only interprets complete lines.

#[cfg(test)]
#[path = "sse_test.rs"]
mod sse_test;

/// One dispatched server-sent event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    pending: SseEvent,
    has_data: bool,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every event completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            if !self.has_data {
                self.pending = SseEvent::default();
                return None;
            }
            self.has_data = false;
            return Some(std::mem::take(&mut self.pending));
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => {
                if self.has_data {
                    self.pending.data.push('\n');
                }
                self.pending.data.push_str(value);
                self.has_data = true;
            }
            "event" => self.pending.event = Some(value.to_owned()),
            "id" => self.pending.id = Some(value.to_owned()),
            _ => {}
        }
        None
    }
}

/// A match handed out by the matchmaking stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchAssignment {
    pub match_id: String,
    pub time_format_ms: u64,
    pub increment_ms: u64,
}

/// Parse `matchID,timeFormat,increment`.
#[must_use]
pub fn parse_assignment(data: &str) -> Option<MatchAssignment> {
    let mut parts = data.trim().split(',').map(str::trim);
    let match_id = parts.next().filter(|id| !id.is_empty())?;
    let time_format_ms = parts.next()?.parse().ok()?;
    let increment_ms = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(MatchAssignment { match_id: match_id.to_owned(), time_format_ms, increment_ms })
}
