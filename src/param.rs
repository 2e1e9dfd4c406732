use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static BOUNDS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?[0-9]+(\.[0-9]+)?\s*(,\s*[+-]?[0-9]+(\.[0-9]+)?\s*){3}$")
        .expect("Regex pattern should always compile")
});

/// What a `--download` / `--downloadgps` value looks like.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    HttpUrl,
    FileUrl,
    Bounds,
    FileName,
}

impl ParamKind {
    pub const ALL: [ParamKind; 4] = [
        ParamKind::HttpUrl,
        ParamKind::FileUrl,
        ParamKind::Bounds,
        ParamKind::FileName,
    ];

    /// Guess the kind of a command line parameter. First match wins and
    /// anything unrecognised is a file name.
    ///
    /// This only looks at the shape of the string; whether an URL is
    /// actually usable is decided when it is dispatched.
    pub fn classify(token: &str) -> Self {
        if token.starts_with("http:") || token.starts_with("https:") {
            return Self::HttpUrl;
        }
        if token.starts_with("file:") {
            return Self::FileUrl;
        }
        if BOUNDS_PATTERN.is_match(token) {
            return Self::Bounds;
        }
        Self::FileName
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HttpUrl => "http-url",
            Self::FileUrl => "file-url",
            Self::Bounds => "bounds",
            Self::FileName => "file-name",
        };
        f.write_str(name)
    }
}
