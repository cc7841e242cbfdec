#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::items_after_statements,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::needless_pass_by_value,
    clippy::redundant_closure_for_method_calls,
    clippy::too_many_lines,
    clippy::uninlined_format_args,
    dead_code
)]

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use toggl_mcp::config::Config;
use toggl_mcp::gateway::{self, AppState};
use toggl_mcp::mcp::{self, McpServer};
use toggl_mcp::observability;
use toggl_mcp::prompts::Prompt;

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("argument name cannot be empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CompletionShell {
    #[value(name = "bash")]
    Bash,
    #[value(name = "fish")]
    Fish,
    #[value(name = "zsh")]
    Zsh,
    #[value(name = "powershell")]
    PowerShell,
    #[value(name = "elvish")]
    Elvish,
}

/// Toggl Track over the Model Context Protocol.
#[derive(Parser, Debug)]
#[command(name = "toggl-mcp")]
#[command(version)]
#[command(about = "Expose Toggl Track as MCP resources, tools and prompts.", long_about = None)]
struct Cli {
    /// Path to config.toml (default: ~/.toggl-mcp/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server on stdio (default)
    #[command(long_about = "\
Run the MCP server on stdio.

Reads one JSON-RPC frame per line from stdin and writes one response \
line per request to stdout. Logs go to stderr. This is what MCP clients \
launch, and it runs when no subcommand is given.

Examples:
  toggl-mcp
  RUST_LOG=debug toggl-mcp serve")]
    Serve,

    /// Run the MCP server over HTTP
    #[command(long_about = "\
Run the MCP server over HTTP.

POST one JSON-RPC frame to /mcp; GET /health for a liveness probe. \
Bind address defaults to the values in your config file \
(gateway.host / gateway.port).

Examples:
  toggl-mcp gateway                  # use config defaults
  toggl-mcp gateway -p 8080          # listen on port 8080
  toggl-mcp gateway --host 0.0.0.0   # bind to all interfaces
  toggl-mcp gateway -p 0             # random available port")]
    Gateway {
        /// Port to listen on (use 0 for random available port); defaults to config gateway.port
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to; defaults to config gateway.host
        #[arg(long)]
        host: Option<String>,
    },

    /// Read one resource and print its JSON
    #[command(long_about = "\
Read one resource and print its JSON.

Examples:
  toggl-mcp read me://
  toggl-mcp read workspaces://123/projects")]
    Read {
        /// Resource URI
        uri: String,
    },

    /// Call one tool and print its output
    #[command(long_about = "\
Call one tool and print its output.

Arguments are a JSON object. Exits non-zero when the tool reports an error.

Examples:
  toggl-mcp call get_current_time_entry
  toggl-mcp call get_summary_report '{\"workspace_id\": 123, \"grouping\": \"clients\"}'")]
    Call {
        /// Tool name
        tool: String,

        /// Tool arguments as a JSON object
        args: Option<String>,
    },

    /// Render one prompt
    #[command(long_about = "\
Render one prompt.

Examples:
  toggl-mcp prompt analyze_time_entries workspace_id=123
  toggl-mcp prompt weekly_review workspace_id=123 since=2024-01-01")]
    Prompt {
        /// Prompt name
        name: String,

        /// Prompt arguments as key=value pairs
        #[arg(value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },

    /// List tools, resources, resource templates and prompts
    List,

    /// Show effective configuration (secrets masked)
    Status,

    /// Manage configuration
    #[command(long_about = "\
Manage toggl-mcp configuration.

Use 'schema' to dump the JSON Schema for the config file, which \
documents every available key, type, and default value.

Examples:
  toggl-mcp config schema              # print JSON Schema to stdout
  toggl-mcp config schema > schema.json")]
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },

    /// Generate shell completion script to stdout
    #[command(long_about = "\
Generate shell completion scripts for `toggl-mcp`.

The script is printed to stdout so it can be sourced directly:

Examples:
  source <(toggl-mcp completions bash)
  toggl-mcp completions zsh > ~/.zfunc/_toggl-mcp
  toggl-mcp completions fish > ~/.config/fish/completions/toggl-mcp.fish")]
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Dump the full configuration JSON Schema to stdout
    Schema,
}

/// Load `.env`, start logging and load the config file.
async fn bootstrap(config_path: Option<&Path>, default_level: &str) -> Result<Config> {
    let env_file = dotenv::dotenv().ok();
    observability::init_tracing(default_level);
    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }
    Config::load(config_path).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);

    if let Some(path) = &cli.config {
        if path.as_os_str().is_empty() {
            bail!("--config cannot be empty");
        }
    }

    // Completions and schema stay stdout-only and need neither config nor logging.
    match command {
        Commands::Completions { shell } => {
            let mut stdout = std::io::stdout().lock();
            write_shell_completion(shell, &mut stdout)
        }

        Commands::Config {
            config_command: ConfigCommands::Schema,
        } => {
            let mut stdout = std::io::stdout().lock();
            write_config_schema(&mut stdout)
        }

        Commands::Serve => {
            // stdout is the protocol channel for `serve`; keep stderr quiet too.
            let config = bootstrap(cli.config.as_deref(), "warn").await?;
            let server = McpServer::from_config(&config);
            mcp::run_stdio(&server).await
        }

        Commands::Gateway { port, host } => {
            let config = bootstrap(cli.config.as_deref(), "info").await?;
            let port = port.unwrap_or(config.gateway.port);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let state = AppState::new(
                Arc::new(McpServer::from_config(&config)),
                config.gateway.bearer_token.clone(),
            );
            gateway::run_gateway(&host, port, state).await
        }

        Commands::Read { uri } => {
            let config = bootstrap(cli.config.as_deref(), "info").await?;
            let server = McpServer::from_config(&config);
            let contents = server.read_resource(&uri).await?;
            println!("{}", contents.text);
            Ok(())
        }

        Commands::Call { tool, args } => {
            let config = bootstrap(cli.config.as_deref(), "info").await?;
            let args = match args {
                Some(raw) => serde_json::from_str::<Value>(&raw)
                    .context("Tool arguments must be valid JSON")?,
                None => Value::Object(Map::new()),
            };
            if !args.is_object() {
                bail!("Tool arguments must be a JSON object");
            }
            let server = McpServer::from_config(&config);
            let Some(result) = server.call_tool(&tool, args).await else {
                bail!("Unknown tool: {tool}");
            };
            println!("{}", result.output);
            if !result.success {
                bail!("Tool {tool} failed");
            }
            Ok(())
        }

        Commands::Prompt { name, args } => {
            let config = bootstrap(cli.config.as_deref(), "info").await?;
            let args: Map<String, Value> = args
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            let server = McpServer::from_config(&config);
            let text = server.get_prompt(&name, &Value::Object(args))?;
            println!("{text}");
            Ok(())
        }

        Commands::List => {
            let config = bootstrap(cli.config.as_deref(), "info").await?;
            let server = McpServer::from_config(&config);
            println!("Tools ({}):", server.tools().len());
            for tool in server.tools() {
                println!("  {:<28} {}", tool.name(), tool.description());
            }
            let resources = server.resources().descriptors();
            println!("\nResources ({}):", resources.len());
            for r in &resources {
                println!("  {:<28} {}", r.uri, r.description);
            }
            let templates = server.resources().templates();
            println!("\nResource templates ({}):", templates.len());
            for t in &templates {
                println!("  {:<28} {}", t.uri_template, t.description);
            }
            println!("\nPrompts ({}):", Prompt::ALL.len());
            for p in Prompt::ALL {
                println!("  {:<28} {}", p.name(), p.description());
            }
            Ok(())
        }

        Commands::Status => {
            let config = bootstrap(cli.config.as_deref(), "info").await?;
            println!("toggl-mcp status");
            println!();
            println!("Version:       {}", env!("CARGO_PKG_VERSION"));
            println!("Config:        {}", config.config_path.display());
            println!(
                "Config file:   {}",
                if config.config_path.exists() { "present" } else { "missing (defaults)" }
            );
            println!(
                "Credentials:   {}",
                config.credential_scheme().unwrap_or("none (set TOGGL_API_TOKEN)")
            );
            println!("Resource API:  {}", config.toggl.resource_api.as_str());
            println!("User agent:    {}", config.toggl.user_agent);
            println!(
                "Gateway:       {}:{} (auth: {})",
                config.gateway.host,
                config.gateway.port,
                if config.gateway.bearer_token.is_some() { "bearer" } else { "off" }
            );
            println!();
            println!("Effective configuration:");
            let rendered = toml::to_string_pretty(&config.masked())
                .context("Failed to render configuration")?;
            print!("{rendered}");
            Ok(())
        }
    }
}

fn write_config_schema<W: Write>(writer: &mut W) -> Result<()> {
    let schema = schemars::schema_for!(Config);
    let rendered = serde_json::to_string_pretty(&schema).context("Failed to serialize JSON Schema")?;
    writeln!(writer, "{rendered}")?;
    writer.flush()?;
    Ok(())
}

fn write_shell_completion<W: Write>(shell: CompletionShell, writer: &mut W) -> Result<()> {
    use clap_complete::generate;
    use clap_complete::shells;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, bin_name.clone(), writer),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, bin_name.clone(), writer),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, bin_name.clone(), writer),
        CompletionShell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, bin_name.clone(), writer);
        }
        CompletionShell::Elvish => generate(shells::Elvish, &mut cmd, bin_name, writer),
    }

    writer.flush()?;
    Ok(())
}
