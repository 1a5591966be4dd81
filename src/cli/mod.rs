//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::{EnvelopeConfig, Settings};
use crate::envelope::ConfigField;
use crate::errors::Result;

/// Envelope CLI: hybrid RSA + AES encryption of files and secrets.
#[derive(Parser)]
#[command(
    name = "envelope",
    about = "Hybrid RSA + AES envelope encryption",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Public key (PEM) that seals envelopes [default: from .envelope.toml or public.pem]
    #[arg(long, env = "ENVELOPE_PUBLIC_KEY", global = true)]
    pub public_key: Option<PathBuf>,

    /// Private key (PEM) that opens envelopes [default: from .envelope.toml or private.pem]
    #[arg(long, env = "ENVELOPE_PRIVATE_KEY", global = true)]
    pub private_key: Option<PathBuf>,

    /// Symmetric parameters, e.g. "-aes-256-cbc -pbkdf2 -md sha256 -iter 600000 -saltlen 16"
    #[arg(
        long,
        env = "ENVELOPE_CIPHER_CONFIG",
        global = true,
        allow_hyphen_values = true
    )]
    pub cipher_config: Option<String>,

    /// Key wrap parameters, e.g. "-pkeyopt rsa_padding_mode:oaep -pkeyopt rsa_oaep_md:sha256"
    #[arg(
        long,
        env = "ENVELOPE_KEY_WRAP_CONFIG",
        global = true,
        allow_hyphen_values = true
    )]
    pub key_wrap_config: Option<String>,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Encrypt data into an envelope (stdin/stdout by default)
    Encrypt {
        /// File to encrypt
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the envelope
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Update the envelope at --output in place, keeping its key material
        #[arg(long, requires = "output")]
        update: bool,
    },

    /// Verify and decrypt an envelope (stdin/stdout by default)
    Decrypt {
        /// Envelope to decrypt
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the plaintext
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ignore a stored config field and use the configured value instead
        #[arg(long = "skip-field", value_enum)]
        skip_fields: Vec<ConfigField>,
    },

    /// Re-wrap envelopes for a new key pair without touching their payload
    RotateKey {
        /// Public key of the new key pair
        #[arg(long)]
        new_public_key: PathBuf,

        /// Envelope files to rotate (each is rewritten in place)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Generate a new RSA key pair
    Keygen {
        /// Modulus size: 2048, 3072 or 4096
        #[arg(long, default_value_t = 2048)]
        bits: usize,

        /// Directory for the key files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Base name: writes <name>.pem and <name>.pub.pem
        #[arg(long, default_value = "envelope")]
        name: String,
    },

    /// Show an envelope's parameters and key size without decrypting it
    Inspect {
        /// Envelope file
        file: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Settings and cipher parameters resolved for one invocation.
pub struct Context {
    pub settings: Settings,
    pub config: EnvelopeConfig,
}

/// Load `.envelope.toml` from the working directory and apply CLI overrides.
///
/// `--cipher-config` / `--key-wrap-config` (or their env vars) replace
/// the parameters derived from the settings file.
pub fn load_context(cli: &Cli) -> Result<Context> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let mut config = settings.envelope_config()?;

    if let Some(text) = &cli.cipher_config {
        config.cipher = text.parse()?;
    }
    if let Some(text) = &cli.key_wrap_config {
        config.key_wrap = text.parse()?;
    }

    Ok(Context { settings, config })
}

impl Context {
    /// The public key path from the CLI or settings, warning if it is missing.
    pub fn public_key_path(&self, cli: &Cli) -> PathBuf {
        let path = cli
            .public_key
            .clone()
            .unwrap_or_else(|| self.settings.public_key.clone());
        warn_if_missing(&path, "public key");
        path
    }

    /// The private key path from the CLI or settings, warning if it is missing.
    pub fn private_key_path(&self, cli: &Cli) -> PathBuf {
        let path = cli
            .private_key
            .clone()
            .unwrap_or_else(|| self.settings.private_key.clone());
        warn_if_missing(&path, "private key");
        path
    }
}

/// Warn (but do not fail) when a key file does not exist yet.
///
/// Loading the key later reports the hard error.
pub fn warn_if_missing(path: &Path, what: &str) {
    if !path.exists() {
        output::warning(&format!("{what} not found at {}", path.display()));
    }
}

/// Read all bytes from `path`, or from stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(p) => Ok(std::fs::read(p)?),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Write bytes to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(p) => std::fs::write(p, bytes)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_requires_output() {
        assert!(Cli::try_parse_from(["envelope", "encrypt", "--update"]).is_err());
        assert!(Cli::try_parse_from(["envelope", "encrypt", "--update", "-o", "x.yml"]).is_ok());
    }

    #[test]
    fn skip_fields_use_document_key_names() {
        let cli = Cli::try_parse_from([
            "envelope",
            "decrypt",
            "--skip-field",
            "cipher_config",
            "--skip-field",
            "key_wrap_config",
        ])
        .unwrap();
        match cli.command {
            Commands::Decrypt { skip_fields, .. } => {
                assert_eq!(skip_fields, vec![ConfigField::Cipher, ConfigField::KeyWrap]);
            }
            _ => panic!("expected decrypt"),
        }
    }

    #[test]
    fn cipher_config_accepts_leading_hyphen() {
        let cli = Cli::try_parse_from([
            "envelope",
            "encrypt",
            "--cipher-config",
            "-aes-128-cbc -pbkdf2 -iter 1000",
        ])
        .unwrap();
        assert_eq!(
            cli.cipher_config.as_deref(),
            Some("-aes-128-cbc -pbkdf2 -iter 1000")
        );
    }

    #[test]
    fn rotate_key_needs_at_least_one_file() {
        assert!(Cli::try_parse_from(["envelope", "rotate-key", "--new-public-key", "k.pem"]).is_err());
    }
}
