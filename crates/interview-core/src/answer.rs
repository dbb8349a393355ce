/// The user's in-progress answer to the displayed question.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnswerBuffer {
    text: String,
}

impl AnswerBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
