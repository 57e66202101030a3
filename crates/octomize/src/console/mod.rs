use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub(crate) struct Console;

impl Console {
    pub(crate) fn section(title: &str) {
        println!();
        println!(
            "{}",
            style("╔═══════════════════════════════════╗").bold().magenta()
        );
        println!("{}", style(format!("║  {title}  ")).bold().magenta());
        println!(
            "{}",
            style("╚═══════════════════════════════════╝").bold().magenta()
        );
    }

    pub(crate) fn info(label: &str, value: &str) {
        println!(
            "║ {} {}",
            style(format!("{label}: ")).dim().magenta(),
            style(value).white()
        );
    }

    pub(crate) fn success(text: &str) {
        println!("║ {} {}", style("✓").green().bold(), style(text).green());
    }

    pub(crate) fn warning(text: &str) {
        println!("║ {} {}", style("⚠").yellow().bold(), style(text).yellow());
    }

    pub(crate) fn error(text: &str) {
        println!("║ {} {}", style("✗").red().bold(), style(text).red());
    }

    pub(crate) fn progress(text: &str) {
        println!("║ {} {}", style("→").cyan().bold(), style(text).cyan());
    }

    pub(crate) fn spinner(text: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(spinner_style);
        pb.set_message(text.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}
