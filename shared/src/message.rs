//! Platform-neutral outgoing messages
//!
//! Handlers build a [`Reply`]; each adapter turns its segments into the
//! wire format of its platform.

/// Music provider of a music segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicKind {
    /// NetEase Cloud Music, `163` on the wire
    NetEase,
}

impl MusicKind {
    pub fn code(&self) -> &'static str {
        match self {
            MusicKind::NetEase => "163",
        }
    }
}

/// A single piece of a message
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    /// Encoded image bytes with a file name used when uploading
    Image { name: String, data: Vec<u8> },
    Music { kind: MusicKind, id: i64 },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text(text.into())
    }

    pub fn image(name: impl Into<String>, data: Vec<u8>) -> Self {
        Segment::Image {
            name: name.into(),
            data,
        }
    }
}

/// Ordered list of segments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    segments: Vec<Segment>,
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::text(text)],
        }
    }

    pub fn push(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concatenated text of all text segments
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl From<Segment> for Message {
    fn from(segment: Segment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

/// A message sent back into the conversation that triggered it
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub message: Message,
    /// Mention the sender in group chats
    pub at_sender: bool,
}

impl Reply {
    pub fn new(message: impl Into<Message>) -> Self {
        Self {
            message: message.into(),
            at_sender: false,
        }
    }

    pub fn at_sender(message: impl Into<Message>) -> Self {
        Self {
            message: message.into(),
            at_sender: true,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Message::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_skips_non_text_segments() {
        let message = Message::text("目标体重 60kg\n")
            .push(Segment::image("chart.png", vec![1, 2, 3]))
            .push(Segment::text("done"));

        assert_eq!(message.plain_text(), "目标体重 60kg\ndone");
        assert_eq!(message.segments().len(), 3);
    }

    #[test]
    fn test_reply_at_sender() {
        let reply = Reply::at_sender(Message::text("hi"));
        assert!(reply.at_sender);
        assert!(!Reply::text("hi").at_sender);
    }

    #[test]
    fn test_music_kind_code() {
        assert_eq!(MusicKind::NetEase.code(), "163");
    }
}
