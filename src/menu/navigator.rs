/// Screens of the interactive menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    Installer,
    Uninstaller,
    Editor,
    Setup,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Main => "archapps",
            Screen::Installer => "Install apps",
            Screen::Uninstaller => "Remove apps",
            Screen::Editor => "Edit app list",
            Screen::Setup => "System setup",
        }
    }
}

/// Owns the stack of open screens. Screens only name where to go next; the
/// navigator decides what is on top.
#[derive(Debug)]
pub struct Navigator {
    stack: Vec<Screen>,
}

impl Navigator {
    pub fn new(root: Screen) -> Self {
        Self { stack: vec![root] }
    }

    pub fn current(&self) -> Option<Screen> {
        self.stack.last().copied()
    }

    /// Open `screen` on top, unless it is already showing
    pub fn show(&mut self, screen: Screen) {
        if self.current() != Some(screen) {
            self.stack.push(screen);
        }
    }

    /// Close the top screen and return it. Closing the root empties the stack,
    /// which ends the menu.
    pub fn close(&mut self) -> Option<Screen> {
        self.stack.pop()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_and_close() {
        let mut nav = Navigator::new(Screen::Main);
        nav.show(Screen::Installer);
        assert_eq!(nav.current(), Some(Screen::Installer));
        assert_eq!(nav.depth(), 2);

        assert_eq!(nav.close(), Some(Screen::Installer));
        assert_eq!(nav.current(), Some(Screen::Main));
    }

    #[test]
    fn test_show_same_screen_twice_is_noop() {
        let mut nav = Navigator::new(Screen::Main);
        nav.show(Screen::Setup);
        nav.show(Screen::Setup);
        assert_eq!(nav.depth(), 2);
    }

    #[test]
    fn test_closing_root_ends_navigation() {
        let mut nav = Navigator::new(Screen::Main);
        assert_eq!(nav.close(), Some(Screen::Main));
        assert_eq!(nav.current(), None);
        assert_eq!(nav.close(), None);
    }
}
