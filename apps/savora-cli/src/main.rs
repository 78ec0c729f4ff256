//! Developer CLI for the recommendation engine: load a catalog artifact,
//! run queries against it, inspect health. Not a serving transport.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use savora_core::config::EngineConfig;
use savora_core::types::{Recommendation, RecommendRequest};
use savora_embed::HashingEmbedder;
use savora_engine::{Catalog, CatalogArtifact, RecipeEngine};
use savora_semantic::{FlatIndex, Metric};

struct Options {
    catalog: PathBuf,
    cuisine: Option<String>,
    diet: Option<String>,
    limit: Option<usize>,
    json: bool,
    rest: Vec<String>,
}

fn usage(prog: &str) -> ! {
    eprintln!("Usage: {prog} <query|similar|health|tags> [args...]");
    eprintln!("  {prog} query <ingredient>... [--cuisine C] [--diet D] [--limit N] [--catalog PATH] [--json]");
    eprintln!("  {prog} similar <recipe_id> [--limit N] [--catalog PATH] [--json]");
    eprintln!("  {prog} health [--catalog PATH]");
    eprintln!("  {prog} tags [--catalog PATH]");
    std::process::exit(1);
}

fn parse_options(prog: &str, args: Vec<String>) -> Options {
    let mut opts = Options {
        catalog: PathBuf::from("catalog.json"),
        cuisine: None,
        diet: None,
        limit: None,
        json: false,
        rest: Vec::new(),
    };
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--catalog" => match iter.next() {
                Some(path) => opts.catalog = PathBuf::from(path),
                None => usage(prog),
            },
            "--cuisine" => match iter.next() {
                Some(c) => opts.cuisine = Some(c),
                None => usage(prog),
            },
            "--diet" => match iter.next() {
                Some(d) => opts.diet = Some(d),
                None => usage(prog),
            },
            "--limit" => match iter.next().and_then(|n| n.parse().ok()) {
                Some(n) => opts.limit = Some(n),
                None => {
                    eprintln!("Error: --limit requires a number");
                    std::process::exit(1);
                }
            },
            "--json" => opts.json = true,
            _ if arg.starts_with('-') => usage(prog),
            _ => opts.rest.push(arg),
        }
    }
    opts
}

fn build_engine(config: EngineConfig, opts: &Options) -> anyhow::Result<RecipeEngine> {
    let artifact = CatalogArtifact::load(&opts.catalog)
        .with_context(|| format!("loading catalog artifact {}", opts.catalog.display()))?;
    let embedder = HashingEmbedder::new(artifact.embedding_dim);
    let index = FlatIndex::build(artifact.embedding_entries()).context("building vector index")?;
    let catalog = Catalog::from_artifact(&artifact).context("validating catalog artifact")?;
    let engine = RecipeEngine::new(config, Arc::new(embedder));
    engine.load_catalog(catalog, Arc::new(index), Metric::CosineDistance);
    Ok(engine)
}

fn print_recommendation(rec: &Recommendation, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rec)?);
        return Ok(());
    }
    println!(
        "{} result(s) from {} candidate(s) in {}ms{}",
        rec.results.len(),
        rec.total_candidates_considered,
        rec.elapsed_ms,
        if rec.cache_hit { " (cached)" } else { "" }
    );
    for (i, r) in rec.results.iter().enumerate() {
        println!(
            "  {}. {:.4}  {}  [{} | {} min | {:?}]",
            i + 1,
            r.hybrid_score,
            r.recipe.name,
            r.recipe.cuisine,
            r.recipe.cook_time_minutes,
            r.recipe.difficulty,
        );
        println!(
            "      lexical {:.4}  semantic {:.4}  id={}",
            r.lexical_score, r.semantic_score, r.recipe.id
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        usage(&prog);
    }
    let cmd = args.remove(0);
    let opts = parse_options(&prog, args);

    let config = EngineConfig::load().context("loading engine config")?;
    let engine = build_engine(config, &opts)?;

    match cmd.as_str() {
        "query" => {
            if opts.rest.is_empty() {
                usage(&prog);
            }
            let request = RecommendRequest {
                ingredients: opts.rest.clone(),
                cuisine_filter: opts.cuisine.clone(),
                diet_filter: opts.diet.clone(),
                max_results: opts.limit,
            };
            let rec = engine.recommend(&request).await?;
            print_recommendation(&rec, opts.json)?;
        }
        "similar" => {
            let id = opts.rest.first().cloned().unwrap_or_else(|| usage(&prog));
            let rec = engine.find_similar(&id, opts.limit).await?;
            print_recommendation(&rec, opts.json)?;
        }
        "health" => {
            let health = engine.health();
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        "tags" => {
            println!("cuisines: {}", engine.cuisines()?.join(", "));
            println!("diets:    {}", engine.diets()?.join(", "));
        }
        _ => {
            eprintln!("Unknown command: {cmd}");
            usage(&prog);
        }
    }
    Ok(())
}
