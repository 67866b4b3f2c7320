/// Icons used in archapps output. Requires a nerd font in the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NerdFont {
    Check,
    Cross,
    Warning,
    Info,
    Question,
    Terminal,
    Package,
    Download,
    Trash,
    Refresh,
    Gear,
    Cpu,
    HardDrive,
    Key,
    List,
}

impl NerdFont {
    pub fn unicode(&self) -> char {
        match self {
            Self::Check => '\u{f00c}',     // fa-check
            Self::Cross => '\u{f00d}',     // fa-times
            Self::Warning => '\u{f071}',   // fa-exclamation-triangle
            Self::Info => '\u{f129}',      // fa-info
            Self::Question => '\u{f128}',  // fa-question
            Self::Terminal => '\u{f120}',  // fa-terminal
            Self::Package => '\u{f187}',   // fa-archive
            Self::Download => '\u{f019}',  // fa-download
            Self::Trash => '\u{f1f8}',     // fa-trash
            Self::Refresh => '\u{f021}',   // fa-refresh
            Self::Gear => '\u{f013}',      // fa-gear
            Self::Cpu => '\u{f2db}',       // fa-microchip
            Self::HardDrive => '\u{f0a0}', // fa-hdd
            Self::Key => '\u{f084}',       // fa-key
            Self::List => '\u{f03a}',      // fa-list
        }
    }
}

impl std::fmt::Display for NerdFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.unicode())
    }
}

impl From<NerdFont> for char {
    fn from(icon: NerdFont) -> Self {
        icon.unicode()
    }
}
