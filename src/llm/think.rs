//! Think-segment extraction
//!
//! Splits streamed content into user-facing text and `<think>…</think>`
//! reasoning. Markers may be split across arbitrary chunk boundaries, so
//! the splitter holds back the longest buffered suffix that could still
//! turn into the marker it is waiting for.

use std::collections::VecDeque;

use crate::llm::stream_events::StreamEvent;

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

/// Incremental content/thinking classifier
#[derive(Debug, Default, Clone)]
pub struct ThinkSplitter {
    buffer: String,
    in_think: bool,
}

impl ThinkSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while inside an open think segment
    pub fn in_think(&self) -> bool {
        self.in_think
    }

    /// Feed one content fragment, returning everything safe to emit
    pub fn push(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(chunk);
        self.drain(false)
    }

    /// Flush whatever is still buffered with its current classification
    ///
    /// An unterminated think segment is closed implicitly.
    pub fn finalize(&mut self) -> Vec<StreamEvent> {
        let out = self.drain(true);
        self.in_think = false;
        out
    }

    fn drain(&mut self, finalize: bool) -> Vec<StreamEvent> {
        let mut out = Vec::new();

        while !self.buffer.is_empty() {
            let marker = if self.in_think { THINK_CLOSE } else { THINK_OPEN };

            if let Some(idx) = self.buffer.find(marker) {
                let before: String = self.buffer.drain(..idx).collect();
                self.emit(&mut out, before);
                self.buffer.drain(..marker.len());
                push_merged(&mut out, StreamEvent::ThinkingDelta(marker.to_string()));
                self.in_think = !self.in_think;
                continue;
            }

            let keep = if finalize {
                0
            } else {
                partial_marker_suffix(&self.buffer, marker)
            };
            let flush_len = self.buffer.len() - keep;
            if flush_len == 0 {
                break;
            }
            let segment: String = self.buffer.drain(..flush_len).collect();
            self.emit(&mut out, segment);
        }

        out
    }

    fn emit(&self, out: &mut Vec<StreamEvent>, text: String) {
        if text.is_empty() {
            return;
        }
        let event = if self.in_think {
            StreamEvent::ThinkingDelta(text)
        } else {
            StreamEvent::ContentDelta(text)
        };
        push_merged(out, event);
    }
}

/// Append an event, merging it into the previous one when both are the
/// same text class
fn push_merged(out: &mut Vec<StreamEvent>, event: StreamEvent) {
    match (out.last_mut(), event) {
        (Some(StreamEvent::ContentDelta(prev)), StreamEvent::ContentDelta(text)) => {
            prev.push_str(&text)
        }
        (Some(StreamEvent::ThinkingDelta(prev)), StreamEvent::ThinkingDelta(text)) => {
            prev.push_str(&text)
        }
        (_, event) => out.push(event),
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of `marker`
pub fn partial_marker_suffix(text: &str, marker: &str) -> usize {
    let max_check = text.len().min(marker.len().saturating_sub(1));
    (1..=max_check)
        .rev()
        .find(|&size| text.ends_with(&marker[..size]))
        .unwrap_or(0)
}

/// Iterator adapter applying [`ThinkSplitter`] to every ContentDelta
///
/// Other events pass through untouched. Pending text is flushed before
/// `UsageFinal`, `Done`, an error, or the end of the inner stream.
pub struct ThinkFilter<I, E>
where
    I: Iterator<Item = Result<StreamEvent, E>>,
{
    inner: I,
    splitter: ThinkSplitter,
    pending: VecDeque<Result<StreamEvent, E>>,
    finished: bool,
}

impl<I, E> ThinkFilter<I, E>
where
    I: Iterator<Item = Result<StreamEvent, E>>,
{
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            splitter: ThinkSplitter::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn flush(&mut self) {
        let tail = self.splitter.finalize();
        self.pending.extend(tail.into_iter().map(Ok));
    }
}

impl<I, E> Iterator for ThinkFilter<I, E>
where
    I: Iterator<Item = Result<StreamEvent, E>>,
{
    type Item = Result<StreamEvent, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }

            match self.inner.next() {
                Some(Ok(StreamEvent::ContentDelta(text))) => {
                    let events = self.splitter.push(&text);
                    self.pending.extend(events.into_iter().map(Ok));
                }
                Some(Ok(event @ StreamEvent::UsageFinal(_))) => {
                    self.flush();
                    self.pending.push_back(Ok(event));
                }
                Some(Ok(event)) if event.is_terminal() => {
                    self.flush();
                    self.pending.push_back(Ok(event));
                    self.finished = true;
                }
                Some(Ok(event)) => self.pending.push_back(Ok(event)),
                Some(Err(err)) => {
                    self.flush();
                    self.pending.push_back(Err(err));
                    self.finished = true;
                }
                None => {
                    self.flush();
                    self.finished = true;
                }
            }
        }
    }
}
