use std::borrow::Cow;

/// A value flowing between loaders: text, or raw bytes for loaders that
/// declare themselves raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl Content {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(text) => text.as_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }

    /// Text view; binary content is decoded lossily
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Content::Text(text) => Cow::Borrowed(text),
            Content::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Content::Text(text) => text,
            Content::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(err) => String::from_utf8_lossy(&err.into_bytes()).into_owned(),
            },
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Content::Text(text) => text.into_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Content::Binary(_))
    }

    /// Representation a loader with the given raw flag expects
    pub(crate) fn coerce(self, raw: bool) -> Content {
        match (raw, self) {
            (true, Content::Text(text)) => Content::Binary(text.into_bytes()),
            (false, Content::Binary(bytes)) => Content::Text(Content::Binary(bytes).into_text()),
            (_, content) => content,
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Binary(bytes)
    }
}
