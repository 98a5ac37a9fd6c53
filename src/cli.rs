use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use floodmon::artifacts::ArtifactStore;
use floodmon::config::Config;
use floodmon::corpus::{CorpusGenerator, TrafficClass};
use floodmon::training::TrainingPipeline;
use floodmon::Detector;

#[derive(Parser)]
#[command(name = "floodmon")]
#[command(author, version, about = "ML-based DDoS traffic classifier")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a corpus, train both models, and save the artifact set
    Train {
        /// Number of corpus samples
        #[arg(short, long)]
        samples: Option<usize>,

        /// Artifact output directory (defaults to the configured one)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Classify simulated traffic of a given class
    Classify {
        /// Traffic class: benign, http-flood, syn-flood, udp-flood
        #[arg(long, default_value = "benign")]
        class: String,

        /// Number of observations to classify
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Show metadata of the trained artifact set
    Info,
}

pub fn run_command(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    match cli.command {
        Commands::Train { samples, out } => cmd_train(config, samples, out),
        Commands::Classify { class, count } => cmd_classify(config, class, count),
        Commands::Info => cmd_info(config),
    }
}

fn cmd_train(config: Config, samples: Option<usize>, out: Option<PathBuf>) -> Result<()> {
    let n = samples.unwrap_or(config.training.samples);
    let out_dir = out.unwrap_or_else(|| config.storage.model_dir.clone());

    println!("Generating {} training samples...", n);
    let corpus = CorpusGenerator::new(config.training.seed).generate(n)?;

    println!("Training models...");
    let pipeline = TrainingPipeline::new(config.training.clone());
    let (artifacts, metadata) = pipeline.run(&corpus)?;

    ArtifactStore::new(&out_dir).save(&artifacts, &metadata)?;

    println!("{}", "Training complete".green().bold());
    println!("Samples:            {}", metadata.n_samples);
    println!("Forest accuracy:    {:.3}", metadata.forest_accuracy);
    println!("Isolation accuracy: {:.3}", metadata.isolation_accuracy);
    println!("Ensemble accuracy:  {:.3}", metadata.ensemble_accuracy);
    println!("Saved to:           {}", out_dir.display());

    Ok(())
}

fn cmd_classify(config: Config, class: String, count: usize) -> Result<()> {
    let class = parse_class(&class)?;
    let detector = Detector::new(config);

    if detector.is_degraded() {
        println!(
            "{}",
            "No trained model found; observations will be reported as Unknown"
                .yellow()
                .bold()
        );
        println!("Run 'floodmon train' first for real classifications\n");
    }

    for _ in 0..count {
        let decision = detector.handle_event(class);
        let label = if decision.is_attack {
            decision.attack_type.as_str().red().bold()
        } else {
            decision.attack_type.as_str().green()
        };
        println!("{}  (confidence {:.2})", label, decision.confidence);
    }

    let snapshot = detector.snapshot();
    println!();
    println!("Alerts raised: {}", snapshot.current.alerts);

    Ok(())
}

fn cmd_info(config: Config) -> Result<()> {
    let store = ArtifactStore::new(&config.storage.model_dir);
    let (_, metadata) = store.load().with_context(|| {
        format!(
            "No usable artifact set at {}",
            config.storage.model_dir.display()
        )
    })?;

    println!("{}", "=== Model Info ===".bold());
    println!();
    println!(
        "Trained at:         {}",
        metadata.trained_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Training samples:   {}", metadata.n_samples);
    println!("Features:           {}", metadata.n_features);
    println!("Forest accuracy:    {:.3}", metadata.forest_accuracy);
    println!("Isolation accuracy: {:.3}", metadata.isolation_accuracy);
    println!("Ensemble accuracy:  {:.3}", metadata.ensemble_accuracy);
    println!();
    println!("Feature order:");
    for name in &metadata.feature_names {
        println!("  {}", name);
    }

    Ok(())
}

/// Parse a traffic class name as given on the command line
fn parse_class(name: &str) -> Result<TrafficClass> {
    match name.to_ascii_lowercase().as_str() {
        "benign" | "normal" => Ok(TrafficClass::Benign),
        "http-flood" | "http_flood" => Ok(TrafficClass::HttpFlood),
        "syn-flood" | "syn_flood" => Ok(TrafficClass::SynFlood),
        "udp-flood" | "udp_flood" => Ok(TrafficClass::UdpFlood),
        other => anyhow::bail!(
            "unknown traffic class '{}' (expected benign, http-flood, syn-flood, or udp-flood)",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_class_accepts_both_spellings() {
        assert_eq!(parse_class("benign").unwrap(), TrafficClass::Benign);
        assert_eq!(parse_class("Normal").unwrap(), TrafficClass::Benign);
        assert_eq!(parse_class("syn-flood").unwrap(), TrafficClass::SynFlood);
        assert_eq!(parse_class("syn_flood").unwrap(), TrafficClass::SynFlood);
        assert_eq!(parse_class("http-flood").unwrap(), TrafficClass::HttpFlood);
        assert_eq!(parse_class("udp_flood").unwrap(), TrafficClass::UdpFlood);
        assert!(parse_class("slowloris").is_err());
    }
}
