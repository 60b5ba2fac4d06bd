//! Multi-turn context sent to the remote model.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Append-only conversation transcript for one session. Never pruned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed round trip: the user's message followed by the model's full reply.
    pub fn record(&mut self, query: &str, reply: &str) {
        self.turns.push(Turn::user(query));
        self.turns.push(Turn::model(reply));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_appends_user_then_model() {
        let mut transcript = Transcript::new();
        transcript.record("convert 1 mile", "1 mile is 1.609 kilometers");
        transcript.record("and 2?", "2 miles is 3.219 kilometers");

        let roles: Vec<Role> = transcript.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, [Role::User, Role::Model, Role::User, Role::Model]);
        assert_eq!(transcript.turns()[2].text, "and 2?");
        assert_eq!(transcript.len(), 4);
    }
}
