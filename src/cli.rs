//! CLI: query → (json | ts) and batch generation of `.query.ts` modules.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::analyze::{QueryType, analyze_query};
use crate::codegen::Codegen;
use crate::config::Config;
use crate::fixture::{FixtureConnection, FixtureNegotiator};
use crate::pool::Client;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// infer TypeScript argument and result types for queries from their negotiated descriptors
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// more logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// JSON config file (pool size, import source, session)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// analyze a single query and print its types
    Analyze(AnalyzeOut),
    /// analyze query files and write a `.query.ts` module for each
    Generate(GenerateOut),
}

#[derive(Args, Debug, Clone)]
struct ClientSettings {
    /// recorded descriptors to replay (JSON fixture document)
    #[arg(long)]
    fixtures: PathBuf,

    /// overrides `pool_size` from the config file
    #[arg(long)]
    pool_size: Option<usize>,

    /// overrides `import_source` from the config file
    #[arg(long)]
    import_source: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Ts,
}

#[derive(clap::Parser, Debug)]
struct AnalyzeOut {
    #[command(flatten)]
    client_settings: ClientSettings,

    /// query text
    #[arg(long, conflicts_with = "query_file")]
    query: Option<String>,

    /// file containing the query text
    #[arg(long)]
    query_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// base name for generated declarations (`--format ts`)
    #[arg(long, default_value = "query")]
    name: String,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    client_settings: ClientSettings,

    /// One or more query files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// output directory (next to each query file if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ClientSettings {
    async fn open(&self, config: &Config) -> Result<Client<FixtureNegotiator>> {
        let negotiator = FixtureNegotiator::load(&self.fixtures)
            .await
            .with_context(|| format!("failed to load fixtures from {}", self.fixtures.display()))?;
        let pool_size = self.pool_size.unwrap_or(config.pool_size);
        if pool_size == 0 {
            bail!("--pool-size must be at least 1");
        }
        tracing::debug!(queries = negotiator.len(), pool_size, "client ready");
        Ok(Client::new(negotiator, FixtureConnection::open(pool_size)).with_session(config.session.clone()))
    }

    fn import_source<'a>(&'a self, config: &'a Config) -> &'a str {
        self.import_source.as_deref().unwrap_or(&config.import_source)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub async fn run(&self) -> Result<()> {
        let config = match self.config.as_ref() {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        match &self.cmd {
            Command::Analyze(target) => target.run(&config).await,
            Command::Generate(target) => target.run(&config).await,
        }
    }
}

impl AnalyzeOut {
    async fn run(&self, config: &Config) -> Result<()> {
        let query = match (&self.query, &self.query_file) {
            (Some(q), _) => q.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read query file {}", path.display()))?
                .trim()
                .to_string(),
            (None, None) => bail!("one of --query or --query-file is required"),
        };

        let client = self.client_settings.open(config).await?;
        let query_type = analyze_query(&client, &query).await?;

        let rendered = match self.format {
            Format::Json => serde_json::to_string_pretty(&query_type)?,
            Format::Ts => emit_module(&query_type, &self.name, self.client_settings.import_source(config))?,
        };
        write_output(self.out.as_deref(), &rendered)
    }
}

impl GenerateOut {
    async fn run(&self, config: &Config) -> Result<()> {
        let sources = resolve_file_path_patterns(&self.input)
            .map_err(|e| anyhow!("failed to resolve input file paths: {e}"))?;
        let client = self.client_settings.open(config).await?;
        let import_source = self.client_settings.import_source(config);

        let mut failed = 0usize;
        for source_path in &sources {
            match self.generate_one(&client, source_path, import_source).await {
                Ok(target) => eprintln!("{} {}", "✅".green(), target.display()),
                Err(error) => {
                    failed += 1;
                    tracing::warn!(path = %source_path.display(), "{error:#}");
                    eprintln!("{} {}: {error:#}", "❌".red(), source_path.display());
                }
            }
        }
        if failed > 0 {
            bail!("{failed} of {} queries failed", sources.len());
        }
        Ok(())
    }

    async fn generate_one(
        &self,
        client: &Client<FixtureNegotiator>,
        source_path: &Path,
        import_source: &str,
    ) -> Result<PathBuf> {
        let query = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read query file {}", source_path.display()))?
            .trim()
            .to_string();
        let stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("query file has no name"))?;

        let query_type = analyze_query(client, &query).await?;
        let module = emit_module(&query_type, &stem, import_source)?;

        let dir = match (&self.out, source_path.parent()) {
            (Some(out), _) => out.clone(),
            (None, Some(parent)) => parent.to_path_buf(),
            (None, None) => PathBuf::from("."),
        };
        let target = dir.join(format!("{stem}.query.ts"));
        write_output(Some(&target), &module)?;
        Ok(target)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn emit_module(query_type: &QueryType, name: &str, import_source: &str) -> Result<String> {
    let mut cg = Codegen::with_import_source(import_source);
    cg.emit(query_type, name)?;
    Ok(cg.into_string())
}

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // explicit glob that matched nothing is an error, not an empty run
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
