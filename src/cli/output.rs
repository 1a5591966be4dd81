//! Colored terminal output helpers.
//!
//! All user-facing status output goes through these functions so we get
//! consistent styling across every command. Envelopes and plaintext
//! written to stdout never pass through here.

use console::style;

use crate::envelope::EnvelopeSummary;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the key-free summary of an envelope.
pub fn print_summary(summary: &EnvelopeSummary) {
    println!("{:<18}{}", style("cipher_config").bold(), summary.cipher_config);
    println!("{:<18}{}", style("key_wrap_config").bold(), summary.key_wrap_config);
    println!(
        "{:<18}RSA {} bits",
        style("wrapping key").bold(),
        summary.wrapping_key_bits
    );
    println!("{:<18}{} bytes", style("payload").bold(), summary.payload_bytes);

    if !summary.configs_supported {
        warning("this envelope uses parameters this build does not support");
    }
}
