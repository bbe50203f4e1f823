/// Every member proposes exactly this many songs, once.
pub const PROPOSALS_PER_MEMBER: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProposal {
    pub title: String,
    pub author: String,
    pub link: Option<String>,
}

impl NewProposal {
    pub fn new(title: &str, author: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            author: author.trim().to_string(),
            link: None,
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.author.is_empty()
    }
}

/// Blank links are stored by the submission form as empty strings.
pub(crate) fn normalize_link(link: Option<String>) -> Option<String> {
    link.map(|link| link.trim().to_string())
        .filter(|link| !link.is_empty())
}
