use std::fmt;

/// Representa un track reproducible
///
/// Inmutable una vez creado: la cola que lo contiene es su única dueña.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Track {
    title: String,
    author: String,
    uri: String,
}

impl Track {
    pub fn new(title: impl Into<String>, author: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            uri: uri.into(),
        }
    }

    // Getters
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn author(&self) -> &str {
        &self.author
    }
    /// Identificador opaco de la fuente (URL, `ytsearch:...`, etc.)
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_display() {
        let track = Track::new("Bohemian Rhapsody", "Queen", "https://youtu.be/fJ9rUzIMcZQ");
        assert_eq!(track.to_string(), "Bohemian Rhapsody - Queen");
        assert_eq!(track.uri(), "https://youtu.be/fJ9rUzIMcZQ");
    }
}
