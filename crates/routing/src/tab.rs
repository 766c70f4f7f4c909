use std::collections::VecDeque;

use crate::error::RoutingResult;
use crate::matcher::{TabMatcher, TabRule};
use crate::message::{Message, SequenceId};

/// Log length used when no explicit limit is configured.
pub const DEFAULT_MAX_MESSAGES: usize = 1_000;

/// Named message filter with routing flags and its own delivered-message log.
#[derive(Debug, Clone)]
pub struct ChatTab {
    name: String,
    rule: TabRule,
    priority: i32,
    always_add: bool,
    skip_others: bool,
    max_messages: usize,
    messages: VecDeque<Message>,
}

impl ChatTab {
    pub fn new(name: impl Into<String>, rule: TabRule) -> Self {
        Self {
            name: name.into(),
            rule,
            priority: 0,
            always_add: false,
            skip_others: false,
            max_messages: DEFAULT_MAX_MESSAGES,
            messages: VecDeque::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_always_add(mut self, always_add: bool) -> Self {
        self.always_add = always_add;
        self
    }

    pub fn with_skip_others(mut self, skip_others: bool) -> Self {
        self.skip_others = skip_others;
        self
    }

    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.set_max_messages(max_messages);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self) -> &TabRule {
        &self.rule
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn always_add(&self) -> bool {
        self.always_add
    }

    pub fn skip_others(&self) -> bool {
        self.skip_others
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Caps the log; a limit of zero is raised to one.
    pub fn set_max_messages(&mut self, max_messages: usize) {
        self.max_messages = max_messages.max(1);
        self.evict_overflow();
    }

    /// Appends one delivered message, evicting the oldest entries past the cap.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push_back(message);
        self.evict_overflow();
    }

    /// Delivered messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Messages whose display content contains `filter`, ignoring case.
    pub fn find(&self, filter: &str) -> Vec<&Message> {
        let filter = filter.to_lowercase();
        self.messages
            .iter()
            .filter(|message| {
                filter.is_empty() || message.content.to_lowercase().contains(&filter)
            })
            .collect()
    }

    /// Flips the deletable flag of the delivered copy with `sequence_id`.
    ///
    /// Returns false when the message is not (or no longer) in this tab.
    pub fn set_deletable(&mut self, sequence_id: SequenceId, deletable: bool) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|message| message.sequence_id() == sequence_id)
        {
            Some(message) => {
                message.deletable = deletable;
                true
            }
            None => false,
        }
    }

    /// Moves the log of a tab being replaced by a configuration edit into this one.
    pub fn adopt_messages(&mut self, previous: ChatTab) {
        self.messages = previous.messages;
        self.evict_overflow();
    }

    fn evict_overflow(&mut self) {
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }
}

impl TabMatcher for ChatTab {
    fn try_matches(&self, text: &str) -> RoutingResult<bool> {
        self.rule.try_matches(text)
    }
}
