use colored::*;
use lazy_static::lazy_static;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
    Debug,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

lazy_static! {
    static ref RENDERER: RwLock<Renderer> = RwLock::new(Renderer::default());
}

static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

pub fn init(format: OutputFormat, color: bool) {
    if let Ok(mut r) = RENDERER.write() {
        r.format = format;
        r.color = color;
    }
}

pub mod nerd_font;
pub use nerd_font::NerdFont;

pub const SEPARATOR_LIGHT: &str = "─";

#[derive(Serialize)]
struct Event<'a> {
    level: &'a str,
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

fn colorize(level: Level, s: &str, enable: bool) -> String {
    if !enable {
        return s.to_string();
    }
    match level {
        Level::Info => s.normal().to_string(),
        Level::Success => s.green().bold().to_string(),
        Level::Warn => s.yellow().bold().to_string(),
        Level::Error => s.red().bold().to_string(),
        Level::Debug => s.cyan().to_string(),
    }
}

fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI sequences end at the first char in '@'..='~'
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn current_renderer() -> Renderer {
    RENDERER
        .read()
        .map(|r| r.clone())
        .unwrap_or_default()
}

pub fn emit(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) {
    if matches!(level, Level::Debug) && !is_debug_enabled() {
        return;
    }

    let r = current_renderer();
    let mut out: Box<dyn Write> = match level {
        Level::Error | Level::Warn => Box::new(io::stderr()),
        _ => Box::new(io::stdout()),
    };
    match r.format {
        OutputFormat::Text => {
            let _ = writeln!(out, "{}", colorize(level, message, r.color));
        }
        OutputFormat::Json => {
            let clean_msg = strip_ansi(message);
            let ev = Event {
                level: level.as_str(),
                code,
                message: &clean_msg,
                data,
            };
            if let Ok(s) = serde_json::to_string(&ev) {
                let _ = writeln!(out, "{}", s);
            }
        }
    }
}

pub fn get_output_format() -> OutputFormat {
    current_renderer().format
}

pub fn separator() {
    let r = current_renderer();
    // Separators would break line-oriented JSON consumers
    if matches!(r.format, OutputFormat::Json) {
        return;
    }
    let _ = writeln!(io::stdout(), "{}", SEPARATOR_LIGHT.repeat(60));
}

pub mod prelude {
    pub use super::{Level, NerdFont, OutputFormat, emit, get_output_format, separator};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_strip_ansi_removes_color_codes() {
        let coloured = "\x1b[1;32mdone\x1b[0m";
        assert_eq!(strip_ansi(coloured), "done");
    }

    #[test]
    fn test_strip_ansi_keeps_plain_text() {
        assert_eq!(strip_ansi("firefox [OfficialRepo]"), "firefox [OfficialRepo]");
    }

    #[test]
    fn test_strip_ansi_keeps_icons() {
        let icon = char::from(NerdFont::Check);
        let message = format!("\x1b[32m{} done\x1b[0m", icon);
        assert_eq!(strip_ansi(&message), format!("{} done", icon));
    }

    #[test]
    #[serial]
    fn test_debug_mode_toggle() {
        set_debug_mode(true);
        assert!(is_debug_enabled());
        set_debug_mode(false);
        assert!(!is_debug_enabled());
    }

    #[test]
    #[serial]
    fn test_init_switches_output_format() {
        init(OutputFormat::Json, false);
        assert_eq!(get_output_format(), OutputFormat::Json);
        init(OutputFormat::Text, true);
        assert_eq!(get_output_format(), OutputFormat::Text);
    }

    #[test]
    fn test_colorize_disabled_is_identity() {
        assert_eq!(colorize(Level::Error, "boom", false), "boom");
    }
}
