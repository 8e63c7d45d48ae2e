use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

/// In-memory practice conversation, bounded to the most recent `max_turns` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
    max_turns: usize,
}

impl ConversationLog {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: vec![],
            max_turns: max_turns.max(1),
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Changing the bound trims immediately. Returns the number of dropped turns.
    pub fn set_max_turns(&mut self, max_turns: usize) -> usize {
        self.max_turns = max_turns.max(1);
        self.trim()
    }

    pub fn push(
        &mut self,
        role: Role,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> usize {
        self.turns.push(ConversationTurn {
            role,
            content: content.into(),
            timestamp: timestamp.into(),
        });
        self.trim()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    fn trim(&mut self) -> usize {
        if self.turns.len() <= self.max_turns {
            return 0;
        }
        let dropped = self.turns.len() - self.max_turns;
        self.turns.drain(..dropped);
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_most_recent_turns() {
        let mut log = ConversationLog::new(3);
        for i in 0..5 {
            log.push(Role::User, format!("m{i}"), "12:00:00");
        }
        let contents: Vec<_> = log.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn shrinking_bound_reports_dropped_turns() {
        let mut log = ConversationLog::new(10);
        log.push(Role::User, "hola", "t");
        log.push(Role::Assistant, "¡Hola!", "t");
        assert_eq!(log.set_max_turns(1), 1);
        assert_eq!(log.turns()[0].role, Role::Assistant);
    }
}
