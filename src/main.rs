use anyhow::Result;
use clap::{Parser, ValueEnum};
use movierec::algorithms::{AssociationRuleRanker, RandomRanker, Recommender};
use movierec::utils::validation::validate_top_k;
use movierec::{init_tracing, Config, EvaluationReport, Evaluator};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Ranker {
    Random,
    AssociationRules,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, value_enum, default_value = "association-rules")]
    ranker: Ranker,

    #[arg(long)]
    dataset_dir: Option<PathBuf>,

    #[arg(long)]
    user_limit: Option<usize>,

    #[arg(short = 'k', long, allow_negative_numbers = true)]
    top_k: Option<i64>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the report as JSON instead of `name: value` lines.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let mut config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    if let Some(dir) = args.dataset_dir {
        config.dataset.dir = dir;
    }
    if let Some(limit) = args.user_limit {
        config.dataset.user_limit = Some(limit);
    }
    if let Some(k) = args.top_k {
        config.evaluation.top_k = validate_top_k(k)?;
    }
    if args.seed.is_some() {
        config.dataset.seed = args.seed;
    }

    info!("Evaluation configuration: {:?}", config);

    let top_k = config.evaluation.top_k;
    let mut ranker: Box<dyn Recommender> = match args.ranker {
        Ranker::Random => {
            Box::new(RandomRanker::from_seed(&config.random, top_k, config.dataset.seed)?)
        }
        Ranker::AssociationRules => {
            Box::new(AssociationRuleRanker::new(config.association_rules.clone(), top_k)?)
        }
    };

    let evaluator = Evaluator::new(config)?;
    let report = evaluator.run(ranker.as_mut())?;
    print_report(&report, args.json)?;

    Ok(())
}

fn print_report(report: &EvaluationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{} (k={}, users={})", report.ranker, report.k, report.users_evaluated);
    for (name, value) in report.metrics() {
        println!("  {}: {:.4}", name, value);
    }
    Ok(())
}
