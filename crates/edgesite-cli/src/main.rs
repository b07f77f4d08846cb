use clap::{Parser, Subcommand};
use edgesite_core::ContextOverride;
use edgesite_pack::TransformKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "edgesite",
    about = "edgesite: static sites with security headers injected at the edge",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a site.toml scaffold with the default security headers
    Init {
        /// Directory to create site.toml in
        #[arg(short, long, default_value = ".")]
        path: String,
        #[arg(long, default_value = "example.com")]
        domain: String,
        #[arg(long, default_value = "www")]
        sub_domain: String,
    },
    /// Generate the response-header function and print it
    Build {
        #[arg(long, default_value = "site.toml")]
        config: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
        /// Function flavour: lambda-edge or rules
        #[arg(short, long, default_value = "lambda-edge")]
        transform: TransformKind,
    },
    /// Write the packaged function and its manifest to a directory
    Pack {
        #[arg(long, default_value = "site.toml")]
        config: String,
        #[arg(short, long, default_value = "dist")]
        out: String,
        #[arg(short, long, default_value = "lambda-edge")]
        transform: TransformKind,
    },
    /// Print (or write) the site's resource graph as JSON
    Synth {
        #[arg(long, default_value = "site.toml")]
        config: String,
        /// Override a site setting, e.g. -c account=123456789012
        #[arg(short = 'c', long = "context", value_name = "KEY=VALUE")]
        context: Vec<ContextOverride>,
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Publish the function version and bind it to the site's distribution.
    ///
    /// Publishing is idempotent: deploying unchanged headers leaves the
    /// current binding alone.
    Deploy {
        #[arg(long, default_value = "site.toml")]
        config: String,
        #[arg(short = 'c', long = "context", value_name = "KEY=VALUE")]
        context: Vec<ContextOverride>,
        #[arg(long, default_value = commands::DEFAULT_STATE_PATH)]
        state: String,
    },
    /// Show edge bindings and published versions
    Status {
        #[arg(long, default_value = commands::DEFAULT_STATE_PATH)]
        state: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("edgesite=info".parse()?)
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path, domain, sub_domain } => {
            commands::init::init(&path, &domain, &sub_domain)
        }
        Commands::Build { config, format, transform } => {
            commands::build::build(&config, &format, transform)
        }
        Commands::Pack { config, out, transform } => {
            commands::pack::pack(&config, &out, transform)
        }
        Commands::Synth { config, context, out } => {
            commands::synth::synth(&config, &context, out.as_deref())
        }
        Commands::Deploy { config, context, state } => {
            commands::deploy::deploy(&config, &context, &state)
        }
        Commands::Status { state, format } => {
            commands::status::status(&state, &format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_accepts_text_and_json() {
        let cli = Cli::try_parse_from(["edgesite", "build", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Build { format, .. } => assert_eq!(format, "json"),
            _ => panic!("expected build"),
        }
        let cli = Cli::try_parse_from(["edgesite", "status"]).unwrap();
        match cli.command {
            Commands::Status { format, .. } => assert_eq!(format, "text"),
            _ => panic!("expected status"),
        }
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["edgesite", "build", "--format", "yaml"]).is_err());
        assert!(Cli::try_parse_from(["edgesite", "status", "-f", "JSON"]).is_err());
    }
}
