use std::io::{self, IsTerminal, Write};

/// Where user facing warnings go.
pub trait Notifier {
    /// Whether a user is around to see warnings at all.
    fn is_interactive(&self) -> bool;

    fn show_warning(&self, title: &str, message: &str);

    /// Show a warning, or do nothing when headless.
    fn warn(&self, title: &str, message: &str) {
        if self.is_interactive() {
            self.show_warning(title, message);
        }
    }
}

/// Prints warnings to stderr when stderr is a terminal and the run is not
/// headless.
pub struct ConsoleNotifier {
    interactive: bool,
}

impl ConsoleNotifier {
    pub fn new(headless: bool) -> Self {
        Self {
            interactive: !headless && io::stderr().is_terminal(),
        }
    }

    pub fn headless() -> Self {
        Self { interactive: false }
    }
}

impl Notifier for ConsoleNotifier {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn show_warning(&self, title: &str, message: &str) {
        let _ = writeln!(io::stderr().lock(), "{title}: {message}");
    }
}
