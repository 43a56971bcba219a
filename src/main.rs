use anyhow::{Context, Result};
use clap::Parser;
use menu_allergens::config::AppConfig;
use menu_allergens::dietary::DietaryProfile;
use menu_allergens::observability;
use menu_allergens::taxonomy::{self, AllergenTaxonomy};
use menu_allergens::{MatchMode, MenuAnalyzer, OcrResult};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

/// Segment OCR menu text and tag allergens
#[derive(Debug, Parser)]
#[command(name = "menu-allergens", version, about)]
struct Cli {
    /// Menu text file; reads stdin when omitted
    file: Option<PathBuf>,

    /// Treat the input as an OCR service JSON payload ({"text", "confidence"})
    #[arg(long)]
    ocr_json: bool,

    /// Print only the allergen detection result
    #[arg(long)]
    items_only: bool,

    /// Scan the whole text without recovering items
    #[arg(long, conflicts_with = "items_only")]
    unsegmented: bool,

    /// Print menu items grouped by category header
    #[arg(long, conflicts_with_all = ["items_only", "unsegmented"])]
    sections: bool,

    /// Only accept keyword hits on word boundaries
    #[arg(long)]
    whole_word: bool,

    /// Allergen taxonomy JSON file
    #[arg(long)]
    taxonomy: Option<PathBuf>,

    /// Confidence reported for each match
    #[arg(long)]
    confidence: Option<f64>,

    /// Comma-separated allergen restrictions to raise alerts for
    #[arg(long, value_delimiter = ',')]
    restrict: Vec<String>,

    /// Language for alert messages (en, fr)
    #[arg(long)]
    lang: Option<String>,

    /// Render Prometheus metrics to stderr when done
    #[arg(long)]
    metrics: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<T: Serialize> {
    #[serde(flatten)]
    body: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    restriction_alerts: Vec<menu_allergens::dietary::RestrictionAlert>,
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read menu text from {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read menu text from stdin")?;
            Ok(buffer)
        }
    }
}

fn load_taxonomy(cli: &Cli, config: &AppConfig) -> Result<AllergenTaxonomy> {
    let taxonomy = match (&cli.taxonomy, &config.taxonomy_path) {
        (Some(path), _) => AllergenTaxonomy::from_file(path)?,
        (None, Some(path)) => AllergenTaxonomy::from_file(path)?,
        (None, None) => taxonomy::load_taxonomy()?,
    };
    Ok(taxonomy)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if cli.whole_word {
        config.tagger.match_mode = MatchMode::WholeWord;
    }
    if let Some(confidence) = cli.confidence {
        config.tagger.confidence = confidence;
    }
    if cli.metrics {
        config.observability.enable_metrics = true;
    }
    config.validate()?;

    observability::init_tracing(&config.observability)?;
    let metrics_handle = if config.observability.enable_metrics {
        Some(observability::install_metrics_recorder()?)
    } else {
        None
    };
    info!(config = %config.summary(), "Configuration loaded");

    let taxonomy = load_taxonomy(&cli, &config)?;
    let analyzer = MenuAnalyzer::from_app_config(&config, taxonomy)?;

    let input = read_input(cli.file.as_ref())?;
    let ocr = if cli.ocr_json {
        serde_json::from_str::<OcrResult>(&input).context("invalid OCR JSON payload")?
    } else {
        OcrResult::new(input, 1.0)
    };

    let profile = DietaryProfile {
        allergen_restrictions: cli.restrict.clone(),
        language_code: cli.lang.clone(),
    };

    if cli.sections {
        print_json(&analyzer.tagger().segmenter().group_by_category(&ocr.text))?;
    } else if cli.unsegmented {
        print_json(&analyzer.tagger().detect_unsegmented(&ocr.text))?;
    } else if cli.items_only {
        let detection = analyzer.tagger().detect(&ocr.text);
        let restriction_alerts = profile.flag_items(&detection);
        print_json(&Report {
            body: detection,
            restriction_alerts,
        })?;
    } else {
        let analysis = analyzer.analyze(&ocr)?;
        let restriction_alerts = profile.flag_items(&analysis.detection);
        print_json(&Report {
            body: analysis,
            restriction_alerts,
        })?;
    }

    if let Some(handle) = metrics_handle {
        eprintln!("{}", handle.render());
    }
    Ok(())
}
