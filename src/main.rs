use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use tokenizer_engine_rust::{
    CoveragePolicy, ScoreEncoding, Tokenizer, Trainer, TrainerConfig,
};

#[derive(Parser)]
#[command(name = "tokenizer_engine_rust", version, about = "Subword tokenizer engine: train, encode, decode, inspect")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a vocabulary from a text corpus (one record per line)
    Train {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// JSON TrainerConfig; explicit flags override file values
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        vocab_size: Option<usize>,
        #[arg(long)]
        max_piece_len: Option<usize>,
        #[arg(long)]
        prune_fraction: Option<f64>,
        /// Record byte-level unknown fallback instead of codepoint-level
        #[arg(long)]
        byte_fallback: bool,
        /// Store scores as f16 instead of f32
        #[arg(long)]
        f16_scores: bool,
    },
    /// Encode text with a trained model
    Encode {
        #[arg(long)]
        model: PathBuf,
        #[arg(long, conflicts_with = "input")]
        text: Option<String>,
        /// Encode each line of this file instead of --text
        #[arg(long)]
        input: Option<PathBuf>,
        /// Print bare ids instead of id/piece pairs
        #[arg(long)]
        ids_only: bool,
        #[arg(long)]
        no_bos: bool,
        #[arg(long)]
        byte_fallback: bool,
    },
    /// Decode a comma-separated id sequence back to text
    Decode {
        #[arg(long)]
        model: PathBuf,
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u32>,
    },
    /// Print model header, counts, and the special-token table
    Inspect {
        #[arg(long)]
        model: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Train {
            corpus,
            output,
            config,
            vocab_size,
            max_piece_len,
            prune_fraction,
            byte_fallback,
            f16_scores,
        } => {
            let mut trainer_config = match config {
                Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
                None => TrainerConfig::default(),
            };
            if let Some(size) = vocab_size {
                trainer_config.target_vocab_size = size;
            }
            if let Some(len) = max_piece_len {
                trainer_config.max_piece_len = len;
            }
            if let Some(fraction) = prune_fraction {
                trainer_config.prune_fraction = fraction;
            }
            if byte_fallback {
                trainer_config.coverage = CoveragePolicy::Byte;
            }

            let lines = read_lines(&corpus)?;
            let model = Trainer::new(trainer_config).train(&lines)?;
            let encoding = if f16_scores {
                ScoreEncoding::F16
            } else {
                ScoreEncoding::F32
            };
            tokenizer_engine_rust::model_codec::save(&model, &output, encoding)?;
            info!("Model written to {}", output.display());
            Ok(())
        }

        Command::Encode {
            model,
            text,
            input,
            ids_only,
            no_bos,
            byte_fallback,
        } => {
            let mut tokenizer = Tokenizer::from_file(&model)?;
            if no_bos {
                tokenizer = tokenizer.with_add_bos(false);
            }
            if byte_fallback {
                tokenizer = tokenizer.with_coverage(CoveragePolicy::Byte);
            }

            let lines = match (text, input) {
                (Some(text), _) => vec![text],
                (None, Some(path)) => read_lines(&path)?,
                (None, None) => return Err("provide --text or --input".into()),
            };
            for line in &lines {
                if ids_only {
                    let ids: Vec<String> = tokenizer
                        .encode(line)
                        .iter()
                        .map(|id| id.to_string())
                        .collect();
                    println!("{}", ids.join(" "));
                } else {
                    for piece in tokenizer.encode_pieces(line) {
                        println!("{}\t{}", piece.id, piece.text);
                    }
                }
            }
            Ok(())
        }

        Command::Decode { model, ids } => {
            let tokenizer = Tokenizer::from_file(&model)?;
            println!("{}", tokenizer.decode(&ids)?);
            Ok(())
        }

        Command::Inspect { model } => {
            let loaded = tokenizer_engine_rust::model_codec::load(&model)?;
            println!(
                "format v{}, {} pieces, {} special tokens",
                tokenizer_engine_rust::model_codec::FORMAT_VERSION,
                loaded.vocabulary.size(),
                loaded.specials.len()
            );
            for special in &loaded.specials {
                println!("{:?}\t{}\t{}", special.role, special.id, special.text);
            }
            Ok(())
        }
    }
}

fn read_lines(path: &PathBuf) -> Result<Vec<String>, std::io::Error> {
    let reader = BufReader::new(File::open(path)?);
    reader.lines().collect()
}
