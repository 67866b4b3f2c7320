use indicatif::{ProgressBar, ProgressStyle};

use crate::ui::{OutputFormat, get_output_format};

/// Spinner shown while a refresh runs; hidden in JSON mode
pub fn create_spinner(message: String) -> ProgressBar {
    if get_output_format() == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style.tick_chars("⠁⠉⠙⠚⠒⠂⠂⠒⠲⠴⠤⠄⠄⠤⠠⠠⠤⠦⠖⠒⠐⠐⠒⠓⠋ "));
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
