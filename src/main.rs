use std::{path::Path, sync::Arc};

use canonize::{
    RedirectEngine, UrlRequestView,
    config::{ServerConfig, ServerConfigValidator, load_config},
    metrics, server, tracing_setup,
};
use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use url::Url;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "canonize.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file and rule tables
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "canonize.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "canonize.toml")]
        config: String,
    },
    /// Start the redirect server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "canonize.toml")]
        config: String,
    },
    /// Show how a URL would be redirected
    Check {
        /// Configuration file to use
        #[clap(short, long, default_value = "canonize.toml")]
        config: String,
        /// Absolute URL of the request, e.g. http://example.com/Some/Path
        url: String,
        /// Value of the X-Forwarded-Host header to simulate
        #[clap(long)]
        forwarded_host: Option<String>,
        /// Print the result as JSON
        #[clap(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config),
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Check {
            config,
            url,
            forwarded_host,
            json,
        }) => check_url_command(&config, &url, forwarded_host.as_deref(), json),
        Some(Commands::Serve { config }) => serve_command(&config).await,
        None => serve_command(&args.config).await,
    }
}

fn load_engine(config: &ServerConfig) -> Result<RedirectEngine> {
    config
        .redirect
        .build_engine()
        .wrap_err("Failed to build redirect rules")
}

async fn serve_command(config_path: &str) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    tracing_setup::init_tracing(&config.logging)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;
    metrics::describe_metrics();

    tracing::info!("Loaded configuration from {config_path}");

    ServerConfigValidator::validate(&config).wrap_err("Invalid configuration")?;

    let engine = Arc::new(load_engine(&config)?);
    tracing::info!(
        force_host = ?engine.force_host(),
        force_tls = engine.force_tls(),
        force_lower_case = engine.lower_case().is_enabled(),
        force_trailing_slash = engine.trailing_slash().is_enabled(),
        force_no_trailing_slash = engine.no_trailing_slash().is_enabled(),
        regex_redirects = engine.regex_redirects().len(),
        exact_redirects = engine.exact_redirects().len(),
        "Redirect rules loaded"
    );

    println!(
        "canonize listening on {} (static root: {})",
        config.listen_addr,
        config.static_root.as_deref().unwrap_or("none")
    );

    server::serve(&config, engine).await?;

    Ok(())
}

/// Validate configuration file and exit
fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path) {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = ServerConfigValidator::validate(&config) {
        eprintln!("❌ Configuration validation failed:");
        eprintln!("{e}");
        println!();
        println!("💡 Common fixes:");
        println!("   • force_host is a bare host name, e.g. 'www.example.com'");
        println!("   • Check that rule files and the static root exist");
        println!("   • Verify listen address format (e.g., '127.0.0.1:3000')");
        std::process::exit(1);
    }
    println!("✅ Configuration validation: OK");

    let engine = match load_engine(&config) {
        Ok(engine) => {
            println!("✅ Redirect rules: OK");
            engine
        }
        Err(e) => {
            eprintln!("❌ Loading redirect rules failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    println!();
    println!("📋 Configuration Summary:");
    println!("   • Listen Address: {}", config.listen_addr);
    println!(
        "   • Force Host: {}",
        engine.force_host().unwrap_or("disabled")
    );
    println!("   • Force TLS: {}", engine.force_tls());
    for (name, policy) in [
        ("Force Lower Case", engine.lower_case()),
        ("Force Trailing Slash", engine.trailing_slash()),
        ("Force No Trailing Slash", engine.no_trailing_slash()),
    ] {
        match policy.ignore_pattern() {
            Some(pattern) if policy.is_enabled() => {
                println!("   • {name}: true (ignoring '{pattern}')")
            }
            _ => println!("   • {name}: {}", policy.is_enabled()),
        }
    }
    println!("   • Regex Redirects: {}", engine.regex_redirects().len());
    println!("   • Exact Redirects: {}", engine.exact_redirects().len());
    println!();
    println!("🎉 Configuration is valid and ready to use!");
    Ok(())
}

/// Print the redirect decision for one URL
fn check_url_command(
    config_path: &str,
    url: &str,
    forwarded_host: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    let engine = load_engine(&config)?;

    let url = Url::parse(url).with_context(|| format!("Invalid URL: {url}"))?;
    let view = UrlRequestView::new(&url).with_forwarded_host(forwarded_host);
    let decision = engine.evaluate(&view);
    let policies: Vec<&str> = decision.policies().iter().map(|p| p.as_str()).collect();
    let location = if decision.should_redirect() {
        Some(
            engine
                .redirect_url_for(&view, &decision)
                .wrap_err("Failed to build redirect target")?,
        )
    } else {
        None
    };

    if json {
        let output = serde_json::json!({
            "url": url.as_str(),
            "redirect": decision.should_redirect(),
            "policies": policies,
            "location": location.as_ref().map(Url::as_str),
        });
        println!("{output}");
    } else if let Some(location) = location {
        println!("301 {url} -> {location}");
        println!("   policies: {}", policies.join(", "));
    } else {
        println!("200 {url} (no redirect)");
    }
    Ok(())
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# canonize configuration

# The address to listen on
listen_addr = "127.0.0.1:8080"

# Directory served for requests that are not redirected (404 when unset)
# static_root = "./public"

[logging]
level = "info"
json = false

# Redirect policies; everything is disabled unless enabled here
[redirect]
# force_host = "www.example.com"
force_tls = false
force_lower_case = false
# force_lower_case_ignore = "^/assets/"
force_trailing_slash = false
# force_trailing_slash_ignore = "\\.[a-z]+$"
force_no_trailing_slash = false
# force_no_trailing_slash_ignore = "^/legacy/"

# Two-column CSV files without header: path,target and pattern,template
# redirects_file = "redirects.csv"
# regex_redirects_file = "regex_redirects.csv"

# Inline regex redirects, tried in order before those from regex_redirects_file
# [[redirect.regex_redirects]]
# pattern = "^/de/(.*)"
# replacement = "/$1"
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'canonize serve --config {config_path}' to start the server");
    Ok(())
}
