//! Feature search CLI - Run a search from a JSON run file against a synthetic oracle.

use std::convert::Infallible;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use feature_search::{
    FeatureId, Oracle, SearchConfig, SearchDriver, SearchStrategy,
    schema::{Objective, StrategyKind},
};

/// Run file: search configuration plus the synthetic oracle to score against.
#[derive(Debug, Serialize, Deserialize)]
struct RunFile {
    search: SearchConfig,
    oracle: AdditiveOracle,
    /// Score independent candidates on the rayon pool.
    #[serde(default)]
    parallel: bool,
}

/// Scores a subset as the sum of its features' weights minus a per-feature cost.
#[derive(Debug, Serialize, Deserialize)]
struct AdditiveOracle {
    /// Weight per feature, aligned with `search.features`.
    weights: Vec<f64>,
    /// Cost charged for every included feature.
    #[serde(default)]
    size_penalty: f64,
    #[serde(skip)]
    lookup: Vec<(FeatureId, f64)>,
}

impl AdditiveOracle {
    fn bind(&mut self, features: &[FeatureId]) {
        self.lookup = features
            .iter()
            .copied()
            .zip(self.weights.iter().copied().chain(std::iter::repeat(0.0)))
            .collect();
    }
}

impl Oracle for AdditiveOracle {
    type Error = Infallible;

    fn evaluate(&self, features: &[FeatureId]) -> Result<f64, Infallible> {
        let total: f64 = features
            .iter()
            .map(|f| {
                self.lookup
                    .iter()
                    .find(|(id, _)| id == f)
                    .map_or(0.0, |&(_, w)| w)
            })
            .sum();
        Ok(total - self.size_penalty * features.len() as f64)
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <run.json>", args[0]);
        eprintln!();
        eprintln!("Run a feature-subset search from a JSON run file.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  run.json  Search configuration plus synthetic oracle weights");
        eprintln!();
        eprintln!("An example run file is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_run_file();
        return;
    }

    let path = PathBuf::from(&args[1]);
    let contents = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading run file: {}", e);
        std::process::exit(1);
    });
    let mut run: RunFile = serde_json::from_str(&contents).unwrap_or_else(|e| {
        eprintln!("Error parsing run file: {}", e);
        std::process::exit(1);
    });
    run.oracle.bind(&run.search.features);

    let mut strategy = SearchStrategy::from_config(&run.search).unwrap_or_else(|e| {
        eprintln!("Invalid search configuration: {}", e);
        std::process::exit(1);
    });

    println!("Feature Search");
    println!("==============");
    println!("Strategy: {:?}", strategy.kind());
    println!("Objective: {:?}", strategy.objective());
    println!("Features: {}", run.search.features.len());
    println!("Iterations: {}", strategy.number_of_iterations());
    println!();

    let driver = SearchDriver::new();
    let outcome = if run.parallel {
        driver.run_parallel(&mut strategy, &run.oracle)
    } else {
        driver.run_with_callback(&mut strategy, &run.oracle, |progress| {
            println!(
                "  [{}] eval {}: score={:.4} best={:.4} features={:?}",
                progress.generation,
                progress.evaluations,
                progress.last_score,
                progress.best_score,
                progress.last_features
            );
        })
    };
    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Search failed: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!("{}:", result.change_label);
    for level in &result.levels {
        match level.changed_feature {
            Some(feature) => println!("  {:>4}  {:.4}  {:?}", feature, level.score, level.features),
            None => println!("  {:>4}  {:.4}  {:?}", "-", level.score, level.features),
        }
    }
    println!();
    println!("Best subset: {:?}", result.best_features);
    println!("Best score: {:.6}", result.best_score);
    println!(
        "Evaluations: {} ({} distinct subsets), stopped: {:?}",
        result.stats.evaluations, result.stats.cached_subsets, result.stats.stop_reason
    );
    println!("Time: {:.3}s", result.stats.elapsed_seconds);
}

fn print_example_run_file() {
    let mut search = SearchConfig::new(vec![0, 1, 2, 3, 4, 5])
        .with_strategy(StrategyKind::Evolutionary)
        .with_objective(Objective::Maximize)
        .with_seed(42);
    search.evolution.elitism = 1;

    let run = RunFile {
        search,
        oracle: AdditiveOracle {
            weights: vec![0.9, -0.4, 0.3, 0.0, 1.2, -0.1],
            size_penalty: 0.05,
            lookup: Vec::new(),
        },
        parallel: false,
    };

    println!("Example run file (run.json):");
    match serde_json::to_string_pretty(&run) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
}
