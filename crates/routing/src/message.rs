/// Host-assigned ordinal of one incoming chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceId(pub u64);

impl SequenceId {
    /// Creates a typed sequence identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Opaque identity token the host attaches to signed chat lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageSignature(pub String);

impl MessageSignature {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Host annotation shown next to a chat line (e.g. "modified", "system").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTag {
    pub label: String,
    pub indicator_color: Option<u32>,
}

impl MessageTag {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            indicator_color: None,
        }
    }

    pub fn with_indicator_color(mut self, color: u32) -> Self {
        self.indicator_color = Some(color);
        self
    }
}

/// Arguments of one inbound `route` call, exactly as the host supplies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub content: String,
    pub signature: Option<MessageSignature>,
    pub sequence_id: SequenceId,
    pub tag: Option<MessageTag>,
    pub deletable: bool,
}

impl IncomingMessage {
    /// Creates an unsigned, untagged, non-deletable chat line.
    pub fn new(content: impl Into<String>, sequence_id: SequenceId) -> Self {
        Self {
            content: content.into(),
            signature: None,
            sequence_id,
            tag: None,
            deletable: false,
        }
    }

    pub fn with_signature(mut self, signature: MessageSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_tag(mut self, tag: MessageTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_deletable(mut self, deletable: bool) -> Self {
        self.deletable = deletable;
        self
    }
}

/// Chat line as delivered into tab logs.
///
/// The raw content, signature and sequence id are fixed at creation. Display
/// content, sender, tag and the deletable flag are annotations that routing
/// handlers may rewrite before delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    raw_content: String,
    signature: Option<MessageSignature>,
    sequence_id: SequenceId,
    pub content: String,
    pub sender: Option<String>,
    pub tag: Option<MessageTag>,
    pub deletable: bool,
}

impl Message {
    /// Text as received from the host; this is what tab rules match against.
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    pub fn signature(&self) -> Option<&MessageSignature> {
        self.signature.as_ref()
    }

    pub fn sequence_id(&self) -> SequenceId {
        self.sequence_id
    }

    /// Returns true when a handler replaced the display content.
    pub fn is_rewritten(&self) -> bool {
        self.content != self.raw_content
    }
}

impl From<IncomingMessage> for Message {
    fn from(incoming: IncomingMessage) -> Self {
        Self {
            content: incoming.content.clone(),
            raw_content: incoming.content,
            signature: incoming.signature,
            sequence_id: incoming.sequence_id,
            sender: None,
            tag: incoming.tag,
            deletable: incoming.deletable,
        }
    }
}
