//! Command-line parsing and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;

use etcdkv::{ClientConfig, Condition, EtcdClient, Error, HttpExecutor, KeysValue, Reply, Result};

/// etcdkv - read and write keys in an etcd v2 cluster
#[derive(Parser, Debug)]
#[command(name = "etcdkv")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server address [env: ETCDKV_SERVER] [default: http://127.0.0.1:2379]
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Root namespace keys are resolved under [env: ETCDKV_ROOT]
    #[arg(long, global = true)]
    pub root: Option<String>,

    /// API version path segment [env: ETCDKV_API_VERSION] [default: v2]
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Extra header sent with every request, as `NAME:VALUE` (repeatable)
    #[arg(short = 'H', long = "header", global = true, value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Log request details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the value of a key
    Get { key: String },

    /// Set a key, optionally guarded by its current value or index
    Set {
        key: String,
        value: String,
        #[arg(long)]
        ttl: Option<u64>,
        /// Only set if the current value matches
        #[arg(long)]
        prev_value: Option<String>,
        /// Only set if the current modified index matches
        #[arg(long)]
        prev_index: Option<u64>,
    },

    /// Create a key that must not exist yet
    Mk {
        key: String,
        value: String,
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Update a key that must already exist
    Update {
        key: String,
        value: String,
        #[arg(long)]
        ttl: Option<u64>,
        #[arg(long)]
        prev_value: Option<String>,
        #[arg(long)]
        prev_index: Option<u64>,
    },

    /// Create a directory
    Mkdir {
        key: String,
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Refresh the TTL of a directory
    UpdateDir {
        key: String,
        #[arg(long)]
        ttl: u64,
    },

    /// Remove a key
    Rm { key: String },

    /// Remove a directory
    Rmdir {
        key: String,
        #[arg(short, long)]
        recursive: bool,
    },

    /// List keys under a directory
    Ls {
        #[arg(default_value = "/")]
        key: String,
        #[arg(short, long)]
        recursive: bool,
    },

    /// Print leaf values under a directory
    Values {
        #[arg(default_value = "/")]
        root: String,
        /// Print only this key's value
        #[arg(long)]
        key: Option<String>,
        /// Only list the directory's direct children
        #[arg(long)]
        shallow: bool,
    },

    /// Append a value to a directory under a generated key
    Push {
        dir: String,
        value: String,
        #[arg(long)]
        ttl: Option<u64>,
    },
}

impl Args {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "etcdkv=debug,etcdkv_http=trace"
        } else {
            "warn"
        }
    }

    /// Environment configuration with command-line overrides applied.
    pub fn config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(server) = &self.server {
            config.server = server.clone();
        }
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(version) = &self.api_version {
            config.version = version.clone();
        }
        for (name, value) in &self.headers {
            config = config.with_header(name.clone(), value.clone());
        }
        Ok(config)
    }
}

fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME:VALUE, got `{}`", raw)),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn render_values(values: &KeysValue) -> String {
    match values {
        KeysValue::Single(value) => value.clone(),
        KeysValue::All(map) => map
            .iter()
            .map(|(key, value)| format!("{} = {}", key, value))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn condition(prev_value: &Option<String>, prev_index: Option<u64>) -> Option<Condition> {
    let mut condition = Condition::new();
    if let Some(value) = prev_value {
        condition = condition.prev_value(value.clone());
    }
    if let Some(index) = prev_index {
        condition = condition.prev_index(index);
    }
    (!condition.is_empty()).then_some(condition)
}

/// Connect and execute the parsed command, returning what to print.
pub fn run(args: &Args) -> Result<String> {
    let config = args.config()?;
    tracing::debug!(server = %config.server_url(), root = %config.root, "connecting");
    let client = EtcdClient::connect(&config)?;
    execute(&client, &args.command)
}

pub fn execute<E: HttpExecutor>(
    client: &EtcdClient<E>,
    command: &Command,
) -> Result<String> {
    match command {
        Command::Get { key } => Ok(client.get(key, None)?.unwrap_or_default()),
        Command::Set {
            key,
            value,
            ttl,
            prev_value,
            prev_index,
        } => {
            let condition = condition(prev_value, *prev_index);
            match client.set(key, value, *ttl, condition.as_ref())? {
                Reply::Action(response) => to_json(&response),
                Reply::Error(e) => Err(Error::Service(e)),
            }
        }
        Command::Mk { key, value, ttl } => to_json(&client.mk(key, value, *ttl)?),
        Command::Update {
            key,
            value,
            ttl,
            prev_value,
            prev_index,
        } => {
            let condition = condition(prev_value, *prev_index);
            to_json(&client.update(key, value, *ttl, condition.as_ref())?)
        }
        Command::Mkdir { key, ttl } => to_json(&client.mkdir(key, *ttl)?),
        Command::UpdateDir { key, ttl } => to_json(&client.update_dir(key, *ttl)?),
        Command::Rm { key } => to_json(&client.rm(key)?),
        Command::Rmdir { key, recursive } => to_json(&client.rmdir(key, *recursive)?),
        Command::Ls { key, recursive } => Ok(client.ls(key, *recursive)?.join("\n")),
        Command::Values { root, key, shallow } => {
            let values = client.get_keys_value(root, !shallow, key.as_deref())?;
            Ok(render_values(&values))
        }
        Command::Push { dir, value, ttl } => {
            to_json(&client.set_with_in_order_key(dir, value, *ttl, None)?)
        }
    }
}
