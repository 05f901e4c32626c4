mod report;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ransum_core::{
    Catalog, ConcentrationAnchor, FeedCategory, Ingredient, IntakeGuide, Nutrient, NutrientRatio, Optimizer,
    RationProblem, RationStatus, Requirement, RequirementTable, SpeciesClass, plan_supplements,
};
use ransum_solver::Solver;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_MIN_KG: f64 = 5.0;
const DEFAULT_MAX_KG: f64 = 10.0;
/// Upper intake bound relative to the estimated dry-matter intake
const BODY_WEIGHT_HEADROOM: f64 = 1.2;

#[derive(Parser)]
#[command(name = "ransum")]
#[command(about = "Least-cost ration formulation for cattle, goats and sheep", long_about = None)]
struct Cli {
    /// Log solver progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the cheapest ration meeting a requirement
    Solve {
        #[command(flatten)]
        problem: ProblemArgs,
        /// Number of animals to scale totals for
        #[arg(long, default_value_t = 1)]
        head_count: u32,
        /// Suggest unused ingredients for tight or missing nutrients
        #[arg(long)]
        suggest: bool,
        /// Plan mineral supplements for deficient nutrients
        #[arg(long)]
        supplements: bool,
        /// Show binding constraints and shadow prices
        #[arg(short, long)]
        analysis: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// List species classes and life stages with their minimums
    Stages {
        /// Only this species class, e.g. "dairy goat"
        species: Option<String>,
        /// Requirement table as JSON instead of the built-in one
        #[arg(long)]
        requirements: Option<PathBuf>,
    },
    /// Check a catalog file for errors
    Check {
        /// The catalog JSON file
        file: PathBuf,
    },
    /// Re-solve with one ingredient's price scaled by each factor
    Sweep {
        #[command(flatten)]
        problem: ProblemArgs,
        /// Ingredient whose price is varied
        #[arg(long)]
        ingredient: String,
        /// Price multipliers
        #[arg(long, value_delimiter = ',', default_value = "0.5,0.75,1,1.25,1.5,2")]
        factors: Vec<f64>,
    },
}

#[derive(Args)]
struct ProblemArgs {
    /// Species class, e.g. "beef cattle" or "dairy goat"
    #[arg(long)]
    species: String,
    /// Life stage, e.g. "adult" or "lactating-high"
    #[arg(long)]
    stage: String,
    /// Ingredient catalog as JSON instead of the built-in tables
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Requirement table as JSON instead of the built-in one
    #[arg(long)]
    requirements: Option<PathBuf>,
    /// Use generic minimums when the species and stage are not in the table
    #[arg(long)]
    fallback: bool,
    /// Ingredients to use, comma separated (default: every non-mineral)
    #[arg(long, value_delimiter = ',')]
    feeds: Vec<String>,
    /// Minimum ration per head, kg
    #[arg(long)]
    min_kg: Option<f64>,
    /// Maximum ration per head, kg
    #[arg(long)]
    max_kg: Option<f64>,
    /// Body weight in kg; sets intake bounds from the expected dry-matter intake
    #[arg(long)]
    body_weight: Option<f64>,
    /// Also enforce this mineral minimum (repeatable)
    #[arg(long = "mineral")]
    minerals: Vec<Nutrient>,
    /// Enforce every mineral minimum
    #[arg(long)]
    all_minerals: bool,
    /// Minimum forage fraction of the ration, 0..=1
    #[arg(long)]
    forage_min: Option<f64>,
    /// Nutrient ratio bounds, e.g. ca:p=1.5-2.0 (repeatable)
    #[arg(long = "ratio", value_parser = parse_ratio)]
    ratios: Vec<NutrientRatio>,
    /// How nutrient minimums are anchored
    #[arg(long, value_enum, default_value_t = Anchor::Mix)]
    anchor: Anchor,
    /// Simplex iteration limit
    #[arg(long)]
    max_iterations: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Anchor {
    /// Concentration of the whole mix meets each minimum
    Mix,
    /// Nutrient mass covers the minimums at the minimum intake
    MinimumIntake,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

impl From<Anchor> for ConcentrationAnchor {
    fn from(anchor: Anchor) -> Self {
        match anchor {
            Anchor::Mix => ConcentrationAnchor::MixConcentration,
            Anchor::MinimumIntake => ConcentrationAnchor::MinimumIntake,
        }
    }
}

/// Everything needed to solve and report one ration
struct Setup {
    problem: RationProblem,
    catalog: Catalog,
    guide: Option<IntakeGuide>,
    optimizer: Optimizer,
}

trait OrExit<T> {
    fn or_exit(self, context: &str) -> T;
}

impl<T, E: Display> OrExit<T> for Result<T, E> {
    fn or_exit(self, context: &str) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{}: {}", context, e);
                std::process::exit(1);
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("ransum_core=debug,ransum_solver=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ransum_core=warn,ransum_solver=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Solve {
            problem,
            head_count,
            suggest,
            supplements,
            analysis,
            format,
        } => {
            let setup = prepare(&problem);
            let solution = setup.optimizer.optimize(&setup.problem).or_exit("Invalid problem");

            if format == Format::Json {
                println!("{}", serde_json::to_string_pretty(&solution).or_exit("Error writing JSON"));
            } else {
                report::header(&setup.problem);
                report::solution(&setup.problem, &solution, analysis);

                if let Some(guide) = &setup.guide {
                    report::intake(guide, &solution, head_count);
                }
                if head_count > 1 && solution.is_optimal() {
                    report::herd(&solution.for_herd(head_count));
                }
                if suggest {
                    let used = setup.problem.ingredient_names();
                    let unused = setup.catalog.excluding(&used);
                    report::suggestions(setup.optimizer.alternatives(&setup.problem, &solution, &unused).iter());
                }
                if supplements && solution.is_optimal() {
                    let minerals = mineral_supplements(&setup.catalog);
                    report::supplements(&plan_supplements(&solution, &setup.problem.requirement, &minerals));
                }
            }

            if solution.status != RationStatus::Optimal {
                std::process::exit(1);
            }
        }
        Commands::Stages { species, requirements } => {
            let table = load_requirements(requirements.as_deref());
            let classes: Vec<SpeciesClass> = match species {
                Some(s) => vec![s.parse().or_exit("Unknown species")],
                None => SpeciesClass::ALL.to_vec(),
            };
            report::stages(&table, &classes);
        }
        Commands::Check { file } => {
            let ingredients: Vec<Ingredient> = read_json(&file);
            match Catalog::new(ingredients) {
                Ok(catalog) => {
                    println!("✓ {} is valid", file.display());
                    for category in [FeedCategory::Forage, FeedCategory::Concentrate, FeedCategory::Mineral] {
                        println!("  {} {}", catalog.in_category(category).count(), category);
                    }
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Sweep {
            problem,
            ingredient,
            factors,
        } => {
            let setup = prepare(&problem);
            let points = setup
                .optimizer
                .price_sweep(&setup.problem, &ingredient, &factors)
                .or_exit("Invalid sweep");
            report::header(&setup.problem);
            report::sweep(&ingredient, &points);
        }
    }
}

fn prepare(args: &ProblemArgs) -> Setup {
    let catalog = match &args.catalog {
        Some(path) => Catalog::new(read_json(path)).or_exit("Invalid catalog"),
        None => Catalog::standard_feeds()
            .merge(Catalog::standard_minerals())
            .or_exit("Invalid catalog"),
    };

    let table = load_requirements(args.requirements.as_deref());
    let requirement = match table.resolve(&args.species, &args.stage) {
        Ok(r) => r,
        Err(e) if args.fallback => {
            let class: SpeciesClass = args.species.parse().or_exit("Unknown species");
            eprintln!("Warning: {}; using generic minimums", e);
            Requirement::fallback(class)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run `ransum stages` to list known life stages, or pass --fallback.");
            std::process::exit(1);
        }
    };

    let ingredients = if args.feeds.is_empty() {
        catalog
            .ingredients()
            .iter()
            .filter(|i| i.category != FeedCategory::Mineral)
            .cloned()
            .collect()
    } else {
        catalog.select(&args.feeds).or_exit("Invalid feed selection")
    };

    let guide = args.body_weight.map(|weight| {
        IntakeGuide::estimate(requirement.species_class, weight).or_exit("Invalid body weight")
    });
    let (min_kg, max_kg) = match &guide {
        Some(guide) => {
            let min = args.min_kg.unwrap_or_else(|| guide.dry_matter_kg());
            (min, args.max_kg.unwrap_or(min * BODY_WEIGHT_HEADROOM))
        }
        None => (
            args.min_kg.unwrap_or(DEFAULT_MIN_KG),
            args.max_kg.unwrap_or(DEFAULT_MAX_KG),
        ),
    };
    debug!(min_kg, max_kg, ingredients = ingredients.len(), "intake bounds");

    let mut problem = RationProblem::new(ingredients, requirement, min_kg, max_kg)
        .or_exit("Invalid problem")
        .with_minerals(args.minerals.iter().copied())
        .with_anchor(args.anchor.into());
    if args.all_minerals {
        problem = problem.with_minerals(Nutrient::MINERALS);
    }
    if let Some(fraction) = args.forage_min {
        problem = problem
            .with_category_minimum(FeedCategory::Forage, fraction)
            .or_exit("Invalid forage minimum");
    }
    for ratio in &args.ratios {
        problem = problem.with_ratio(*ratio).or_exit("Invalid ratio");
    }

    let mut solver = Solver::new();
    if let Some(max) = args.max_iterations {
        solver = solver.with_max_iterations(max);
    }

    Setup {
        problem,
        catalog,
        guide,
        optimizer: Optimizer::new().with_solver(solver),
    }
}

fn load_requirements(path: Option<&Path>) -> RequirementTable {
    match path {
        Some(path) => RequirementTable::from_records(read_json(path)).or_exit("Invalid requirements"),
        None => RequirementTable::standard(),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> T {
    let source = std::fs::read_to_string(path).or_exit("Error reading file");
    serde_json::from_str(&source).or_exit(&format!("Error parsing {}", path.display()))
}

/// Mineral items from the catalog, or the built-in table if it has none
fn mineral_supplements(catalog: &Catalog) -> Vec<Ingredient> {
    let minerals: Vec<Ingredient> = catalog.in_category(FeedCategory::Mineral).cloned().collect();
    if minerals.is_empty() {
        Catalog::standard_minerals().ingredients().to_vec()
    } else {
        minerals
    }
}

/// Parse `num:den=min-max`; either bound may be left empty
fn parse_ratio(s: &str) -> Result<NutrientRatio, String> {
    let (pair, bounds) = s
        .split_once('=')
        .ok_or_else(|| format!("expected num:den=min-max, got '{}'", s))?;
    let (num, den) = pair
        .split_once(':')
        .ok_or_else(|| format!("expected num:den, got '{}'", pair))?;
    let (min, max) = bounds
        .split_once('-')
        .ok_or_else(|| format!("expected min-max, got '{}'", bounds))?;

    let bound = |v: &str| -> Result<Option<f64>, String> {
        let v = v.trim();
        if v.is_empty() {
            Ok(None)
        } else {
            v.parse().map(Some).map_err(|_| format!("invalid ratio bound '{}'", v))
        }
    };

    Ok(NutrientRatio::new(
        num.parse().map_err(|e: ransum_core::RationError| e.to_string())?,
        den.parse().map_err(|e: ransum_core::RationError| e.to_string())?,
        bound(min)?,
        bound(max)?,
    ))
}
