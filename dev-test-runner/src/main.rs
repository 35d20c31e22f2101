//! Golden-file runner: for every `<case>/queries/*.edgeql`, analyze the query
//! against `<case>/fixtures.json` and compare the generated module with
//! `<case>/expected/<stem>.query.ts`.
//!
//! Usage: `cargo run -p dev-test-runner -- testdata/*` (`--bless` rewrites expectations).
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use colored::Colorize;
use query_sig::analyze_query;
use query_sig::codegen::Codegen;
use query_sig::fixture::{FixtureConnection, FixtureNegotiator};
use query_sig::pool::Client;

#[tokio::main]
async fn main() -> Result<()> {
    let mut bless = false;
    let mut cases = Vec::<PathBuf>::new();
    for arg in std::env::args().skip(1) {
        if arg == "--bless" {
            bless = true;
        } else {
            cases.push(PathBuf::from(arg));
        }
    }
    if cases.is_empty() {
        bail!("usage: dev-test-runner [--bless] <case-dir>...");
    }

    let mut failed = 0usize;
    let mut total = 0usize;
    for case in &cases {
        let client = Client::new(
            FixtureNegotiator::load(case.join("fixtures.json")).await?,
            FixtureConnection::open(1),
        );
        let pattern = case.join("queries").join("*.edgeql");
        let pattern = pattern.to_str().ok_or_else(|| anyhow!("non-UTF-8 path {}", case.display()))?;
        for entry in glob::glob(pattern)? {
            let query_path = entry?;
            total += 1;
            match run_one(&client, case, &query_path, bless).await {
                Ok(()) => eprintln!("{} {}", "✅ success".green(), query_path.display()),
                Err(error) => {
                    failed += 1;
                    eprintln!("{} {}: {error:#}", "❌ failed".red(), query_path.display());
                }
            }
        }
    }

    eprintln!("—— {} / {total} passed ——", total - failed);
    if failed > 0 {
        bail!("{failed} case(s) failed");
    }
    Ok(())
}

async fn run_one(client: &Client<FixtureNegotiator>, case: &Path, query_path: &Path, bless: bool) -> Result<()> {
    let stem = query_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("no file stem"))?;
    let query = std::fs::read_to_string(query_path)?.trim().to_string();

    let query_type = analyze_query(client, &query).await?;
    let mut cg = Codegen::new();
    cg.emit(&query_type, &stem)?;
    let actual = cg.into_string();

    let expected_path = case.join("expected").join(format!("{stem}.query.ts"));
    if bless {
        std::fs::write(&expected_path, &actual)?;
        return Ok(());
    }
    let expected = std::fs::read_to_string(&expected_path)
        .with_context(|| format!("missing expectation {}", expected_path.display()))?;
    if expected != actual {
        bail!("output differs from {}\n--- expected\n{expected}\n--- actual\n{actual}", expected_path.display());
    }
    Ok(())
}
