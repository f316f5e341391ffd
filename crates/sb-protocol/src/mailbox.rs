//! Ordered, append-only message channel for one direction of one cycle.

use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{Message, MessageKind};

/// Messages exchanged in one direction during one cycle.
///
/// Messages are read by index and never removed; a bounded mailbox refuses
/// sends once full.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mailbox {
    messages: Vec<Message>,
    capacity: Option<usize>,
}

impl Mailbox {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            messages: Vec::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Append a message.
    pub fn send(&mut self, message: Message) -> ProtocolResult<()> {
        if let Some(capacity) = self.capacity {
            if self.messages.len() >= capacity {
                return Err(ProtocolError::MailboxFull { capacity });
            }
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn read(&self, index: usize) -> Option<Message> {
        self.messages.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn contains(&self, message: &Message) -> bool {
        self.messages.contains(message)
    }

    pub fn contains_kind(&self, kind: MessageKind) -> bool {
        self.messages.iter().any(|m| m.kind() == kind)
    }

    pub fn count_kind(&self, kind: MessageKind) -> usize {
        self.messages.iter().filter(|m| m.kind() == kind).count()
    }

    /// First message of the given kind, if any.
    pub fn first_of(&self, kind: MessageKind) -> Option<Message> {
        self.messages.iter().copied().find(|m| m.kind() == kind)
    }
}

impl FromIterator<Message> for Mailbox {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
            capacity: None,
        }
    }
}

impl<'a> IntoIterator for &'a Mailbox {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, m) in self.messages.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{m}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Mode;

    #[test]
    fn bounded_mailbox_refuses_overflow() {
        let mut mb = Mailbox::bounded(2);
        mb.send(Message::Stop).unwrap();
        mb.send(Message::ProgramReady).unwrap();
        assert_eq!(
            mb.send(Message::Stop),
            Err(ProtocolError::MailboxFull { capacity: 2 })
        );
        assert_eq!(mb.len(), 2);
    }

    #[test]
    fn read_by_index_keeps_order() {
        let mb: Mailbox = [Message::Mode(Mode::Normal), Message::OpenPump(0)]
            .into_iter()
            .collect();
        assert_eq!(mb.read(0), Some(Message::Mode(Mode::Normal)));
        assert_eq!(mb.read(1), Some(Message::OpenPump(0)));
        assert_eq!(mb.read(2), None);
        assert_eq!(mb.to_string(), "[MODE(normal), OPEN_PUMP(0)]");
    }

    #[test]
    fn kind_queries() {
        let mb: Mailbox = [
            Message::OpenPump(0),
            Message::ClosePump(1),
            Message::OpenPump(2),
        ]
        .into_iter()
        .collect();
        assert_eq!(mb.count_kind(MessageKind::OpenPump), 2);
        assert!(mb.contains_kind(MessageKind::ClosePump));
        assert!(!mb.contains_kind(MessageKind::Stop));
        assert_eq!(mb.first_of(MessageKind::OpenPump), Some(Message::OpenPump(0)));
    }
}
