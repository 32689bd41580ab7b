use clipblock_core::{DocumentTree, NodeId};
use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Clipblock".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Copy the content block at a point of a web page\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print the located block: tag, id, classes and box
pub fn print_block(tree: &DocumentTree, block: NodeId) {
    let Some(element) = tree.element(block) else {
        return;
    };

    let mut label = format!("<{}", element.tag_name);
    if let Some(id) = element.attr("id") {
        label.push_str(&format!(" id=\"{}\"", id));
    }
    if let Some(class) = element.attr("class") {
        label.push_str(&format!(" class=\"{}\"", class));
    }
    label.push('>');

    eprintln!("  {} {}", "Block:".dimmed(), label.bright_white());
    match element.layout {
        Some(layout) => eprintln!(
            "  {} {}",
            "Box:".dimmed(),
            format!("{:.0}x{:.0} at ({:.0}, {:.0})", layout.rect.width, layout.rect.height, layout.rect.x, layout.rect.y)
                .bright_white()
        ),
        None => eprintln!("  {} {}", "Box:".dimmed(), "unmeasured".dimmed()),
    }
    eprintln!();
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 100.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
