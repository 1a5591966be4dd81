use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use envelope::cli::{commands, output, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Encrypt {
            ref input,
            ref output,
            update,
        } => commands::encrypt::execute(&cli, input.as_deref(), output.as_deref(), update),
        Commands::Decrypt {
            ref input,
            ref output,
            ref skip_fields,
        } => commands::decrypt::execute(&cli, input.as_deref(), output.as_deref(), skip_fields),
        Commands::RotateKey {
            ref new_public_key,
            ref files,
        } => commands::rotate::execute(&cli, new_public_key, files),
        Commands::Keygen {
            bits,
            ref out_dir,
            ref name,
        } => commands::keygen::execute(bits, out_dir, name),
        Commands::Inspect { ref file } => commands::inspect::execute(file),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Logs go to stderr so they never mix with envelopes or plaintext on stdout.
///
/// `--verbose` forces debug level; otherwise `RUST_LOG` applies, falling
/// back to warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}
