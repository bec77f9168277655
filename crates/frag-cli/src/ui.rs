//! Output helpers for the CLI
//!
//! Respects `NO_COLOR`. Errors go to stderr, everything else to stdout.

use colored::*;
use crossterm::terminal::size;
use std::fmt::Display;
use std::io::{self, Write};

use frag_core::Result;

const RULE_WIDTH: usize = 60;

fn colors_enabled() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Display the startup banner
pub fn display_banner(title: &str, subtitle: &str) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let inner = title
        .chars()
        .count()
        .max(subtitle.chars().count())
        .saturating_add(4)
        .min(terminal_width.saturating_sub(2))
        .max(10);

    let top = format!("┌{}┐", "─".repeat(inner));
    let bottom = format!("└{}┘", "─".repeat(inner));
    let line = |text: &str| {
        let pad = inner.saturating_sub(text.chars().count() + 2);
        format!("│  {}{}│", text, " ".repeat(pad))
    };

    println!();
    if colors_enabled() {
        println!("{}", top.blue());
        println!("{}", line(title).blue().bold());
        println!("{}", line(subtitle).blue());
        println!("{}", bottom.blue());
    } else {
        println!("{}", top);
        println!("{}", line(title));
        println!("{}", line(subtitle));
        println!("{}", bottom);
    }
    println!();
}

/// `✓ message`
pub fn success(msg: &str) {
    if colors_enabled() {
        println!("{} {}", "✓".green(), msg);
    } else {
        println!("✓ {}", msg);
    }
}

/// `✗ message` on stderr
pub fn error(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "✗".red(), msg.red());
    } else {
        eprintln!("✗ {}", msg);
    }
}

/// `⚠ message`
pub fn warn(msg: &str) {
    if colors_enabled() {
        println!("{} {}", "⚠".yellow(), msg);
    } else {
        println!("⚠ {}", msg);
    }
}

/// `→ message`
pub fn hint(msg: &str) {
    if colors_enabled() {
        println!("{} {}", "→".cyan(), msg.cyan());
    } else {
        println!("→ {}", msg);
    }
}

/// Step in progress, e.g. `🔍 Searching for: 'q'`
pub fn step(icon: &str, msg: &str) {
    if colors_enabled() {
        println!("{} {}", icon, msg.bold());
    } else {
        println!("{} {}", icon, msg);
    }
}

pub fn header(title: &str) {
    println!();
    if colors_enabled() {
        println!("{}", title.bold());
    } else {
        println!("{}", title);
    }
}

/// `  label  value`
pub fn kv(label: &str, value: impl Display) {
    if colors_enabled() {
        println!("  {}  {}", label.dimmed(), value.to_string().bold());
    } else {
        println!("  {}  {}", label, value);
    }
}

pub fn list_item(item: &str) {
    println!("   - {}", item);
}

pub fn rule() {
    if colors_enabled() {
        println!("{}", "─".repeat(RULE_WIDTH).dimmed());
    } else {
        println!("{}", "─".repeat(RULE_WIDTH));
    }
}

/// Ask a yes/no question; an empty answer means no
pub fn confirm(question: &str) -> Result<bool> {
    if colors_enabled() {
        print!("{} {} [y/N]: ", "❓".cyan(), question);
    } else {
        print!("? {} [y/N]: ", question);
    }
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(is_yes(&response))
}

fn is_yes(response: &str) -> bool {
    matches!(response.trim().to_lowercase().as_str(), "y" | "yes")
}
