//! Terminal styling shared by the binaries.

use clap::builder::styling::{AnsiColor, Color as AnsiTerm, Style};
use clap::builder::Styles;
use crossterm::style::{Color, StyledContent, Stylize};
use unicode_width::UnicodeWidthStr;

const fn ansi(color: AnsiColor) -> Option<AnsiTerm> {
    Some(AnsiTerm::Ansi(color))
}

/// Help output colors for clap.
pub fn get_styles() -> Styles {
    let heading = Style::new().bold().underline().fg_color(ansi(AnsiColor::Blue));
    let good = Style::new().bold().fg_color(ansi(AnsiColor::Green));
    let bad = Style::new().bold().fg_color(ansi(AnsiColor::Red));

    Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(good)
        .valid(good)
        .invalid(bad)
        .error(bad)
        .placeholder(Style::new().fg_color(ansi(AnsiColor::BrightBlack)))
}

pub mod palette {
    use crossterm::style::Color;

    const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::Rgb { r, g, b }
    }

    pub const ACCENT: Color = rgb(95, 175, 255);
    pub const TOKEN: Color = rgb(255, 215, 95);
    pub const OK: Color = rgb(95, 215, 135);
    pub const WARN: Color = rgb(255, 175, 0);
    pub const ERR: Color = rgb(255, 95, 95);
    pub const MUTED: Color = rgb(138, 138, 138);
    pub const TEXT: Color = rgb(230, 230, 230);
}

const RULE: &str = "─";
const SECTION_WIDTH: usize = 60;

fn status_line(mark: &str, color: Color, message: &str) -> String {
    format!(" {} {}", mark.with(color).bold(), message.with(color))
}

fn rule(width: usize) -> StyledContent<String> {
    RULE.repeat(width).with(palette::ACCENT)
}

pub fn print_success(message: &str) {
    println!("{}", status_line("✓", palette::OK, message));
}

/// Goes to stderr.
pub fn print_error(message: &str) {
    eprintln!("{}", status_line("✗", palette::ERR, message));
}

pub fn print_warning(message: &str) {
    println!("{}", status_line("!", palette::WARN, message));
}

/// `╭──── title ────╮`, centered on a fixed width.
pub fn print_section_header(title: &str) {
    let inner = SECTION_WIDTH.saturating_sub(title.width() + 2);
    let left = inner / 2;
    println!();
    println!(
        "{}{} {} {}{}",
        "╭".with(palette::ACCENT),
        rule(left),
        title.with(palette::ACCENT).bold(),
        rule(inner - left),
        "╮".with(palette::ACCENT)
    );
}

pub fn print_section_footer() {
    println!(
        "{}{}{}",
        "╰".with(palette::ACCENT),
        rule(SECTION_WIDTH),
        "╯".with(palette::ACCENT)
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {}",
        format!("{}:", key).with(palette::MUTED),
        value.with(palette::TEXT)
    );
}

/// For values meant to be copied, like keys and tokens.
pub fn print_key_value_highlight(key: &str, value: &str) {
    println!(
        "  {} {}",
        format!("{}:", key).with(palette::ACCENT).bold(),
        value.with(palette::TOKEN).bold()
    );
}

pub fn print_list_item(item: &str, indent: usize) {
    println!(
        "{}{} {}",
        "  ".repeat(indent),
        "-".with(palette::MUTED),
        item.with(palette::TEXT)
    );
}

