use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;
use protocol_harness::analysis::{self, AccuracyTable};
use protocol_harness::logger::{LogTarget, init_logger};
use protocol_harness::runner::{self, DomainResults, ResultsFile};
use protocol_harness::{ChatClient, CooperativeAgent, Domain, HarnessConfig, Mode};
use tracing::{Level, info};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("run") => run_all(load_config()?),
        Some("analyze") => analyze(&args[1..]),
        Some("table") => table(&args[1..]),
        Some(other) => bail!("unknown command `{other}`; expected `run`, `analyze` or `table`"),
    }
}

fn load_config() -> Result<HarnessConfig> {
    let config = match env::var_os("HARNESS_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            HarnessConfig::from_file(&path)
                .with_context(|| format!("loading config from {}", path.display()))?
                .with_env_overrides()
        }
        None => HarnessConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

fn run_all(config: HarnessConfig) -> Result<()> {
    let target = if config.log_to_file {
        LogTarget::File(config.results_dir.join("logs"))
    } else {
        LogTarget::Stderr
    };
    if let Some(path) = init_logger(target, Level::INFO)? {
        println!("Logging to {}", path.display());
    }
    info!(model = %config.model, trials = config.trials, "starting conformance run");

    for domain in Domain::ALL {
        let client = ChatClient::new(
            &config.model,
            &config.api_base,
            config.api_key.clone(),
            config.timeout(),
        )?;
        let agent = CooperativeAgent::new(domain, client);
        let mut results = DomainResults::default();

        for mode in Mode::ALL {
            // Offset per domain and mode so that seeded runs don't replay one sequence.
            let seed = config
                .seed
                .map(|s| s.wrapping_add(domain as u64 * 2 + mode as u64));
            let outcome = runner::run(
                domain,
                &agent,
                config.trials,
                mode,
                config.capture_failures,
                seed,
            )?;

            print_summary(domain, mode, &outcome.aggregate);
            if config.capture_failures {
                let path = config.failure_log_path(domain, mode);
                outcome.failures.persist(&path)?;
                println!("  {} failures written to {}", outcome.failures.len(), path.display());
            }
            results.set(mode, outcome.aggregate);
        }

        let path = config.results_path(domain);
        runner::write_results(&path, &config.model, &results)?;
        println!("Results written to {}\n", path.display());
    }
    Ok(())
}

fn print_summary(domain: Domain, mode: Mode, aggregate: &runner::AggregateResult) {
    println!("{}", format!("{domain} / {mode}").bold());
    for (category, tally) in aggregate.iter() {
        let accuracy = tally.accuracy().unwrap_or(0.0);
        let line = format!(
            "  {category:<10} {:>4} ok {:>4} failed  {accuracy:>6.2}%",
            tally.success, tally.failure
        );
        if tally.failure == 0 {
            println!("{}", line.green());
        } else if tally.success == 0 {
            println!("{}", line.red());
        } else {
            println!("{}", line.yellow());
        }
    }
}

fn analyze(paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        bail!("usage: protocol-harness analyze <failure-log>...");
    }
    init_logger(LogTarget::Stderr, Level::WARN)?;
    for path in paths {
        let report = analysis::analyze_file(Path::new(path))
            .with_context(|| format!("analyzing {path}"))?;
        println!("{}", format!("=== {path} ===").cyan().bold());
        println!("{report}");
    }
    Ok(())
}

fn table(paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        bail!("usage: protocol-harness table <results-file>...");
    }
    for path in paths {
        let results: ResultsFile = runner::read_results(Path::new(path))
            .with_context(|| format!("reading {path}"))?;
        println!("{}", format!("=== {path} ===").cyan().bold());
        println!("{}", AccuracyTable::from_results(&results));
    }
    Ok(())
}
