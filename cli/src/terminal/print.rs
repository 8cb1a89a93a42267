use colored::*;
use tracing::info;
use unicode_width::UnicodeWidthStr;

pub const TOTAL_WIDTH: usize = 64;

/// Raw console line, routed through tracing so the log file sees it too.
pub fn print(msg: &str) {
    info!(target: "pharos::print", "{}", msg);
}

pub fn banner(name: &str) {
    let text_content: String = format!("⟦ {} v{} ⟧ ", name, env!("CARGO_PKG_VERSION"));
    let text_width: usize = UnicodeWidthStr::width(text_content.as_str());
    let text: ColoredString = text_content.bright_green().bold();
    let sep: ColoredString = "═".repeat((TOTAL_WIDTH - text_width) / 2).bright_black();
    let output: String = format!("{}{}{}", sep, text, sep);

    print(&output);
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();

    print(&format!("{}", line));
}

pub fn fat_separator() {
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH).bright_black();
    print(&format!("{}", sep));
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    print(&format!("{}{}", space, msg));
}

/// One row of the uninstall summary.
pub fn phase_line(name: &str, ok: bool) {
    let dots: String = ".".repeat((TOTAL_WIDTH / 2).saturating_sub(name.len() + 1));
    let verdict: ColoredString = if ok {
        "removed".green().bold()
    } else {
        "FAILED".red().bold()
    };
    print(&format!("{} {} {}", name, dots.bright_black(), verdict));
}
