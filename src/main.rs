//! Poseidon Oracle CLI.
//!
//! Exit codes: 0 success, 1 verification or scenario failure, 2 usage or
//! I/O error.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use poseidon_oracle::conformance::{ChaChaSource, CorpusRunner, TestResult};
use poseidon_oracle::poseidon::{ParamTable, PoseidonHash, PoseidonParameters};
use poseidon_oracle::{
    CheckSet, ConstraintSystem, Fr, OracleConfig, PoseidonCircuit, ViolationMode, Witness,
    WitnessVerifier,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "oracle")]
#[command(about = "Poseidon (circomlib, BN254) reference oracle", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information
    Version,

    /// Hash field elements (decimal or 0x-hex); arity is the input count
    Hash {
        /// Inputs in positional order
        #[arg(required = true, allow_negative_numbers = true)]
        inputs: Vec<Fr>,
        /// Print the digest as 64-digit big-endian hex
        #[arg(long)]
        hex: bool,
    },

    /// Print a parameter set
    Params {
        /// Hash arity (circomlib set, 1..=16)
        #[arg(long, default_value_t = 2)]
        arity: usize,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Write the reference circuit's witness and R1CS as snarkjs JSON
    Witness {
        #[arg(required = true, allow_negative_numbers = true)]
        inputs: Vec<Fr>,
        /// Witness output path
        #[arg(long)]
        witness_out: PathBuf,
        /// R1CS output path
        #[arg(long)]
        r1cs_out: Option<PathBuf>,
    },

    /// Verify a witness against the reference hash and an R1CS
    Verify {
        /// snarkjs witness JSON
        #[arg(long)]
        witness: PathBuf,
        /// snarkjs R1CS JSON
        #[arg(long)]
        r1cs: PathBuf,
        /// Inputs the witness was generated for
        #[arg(required = true, allow_negative_numbers = true)]
        inputs: Vec<Fr>,
        /// Checks to run, comma separated
        #[arg(long, default_value = "validity,output,constraints")]
        checks: CheckSet,
        /// Report every violated constraint, not just the first
        #[arg(long)]
        all_violations: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Run scenarios against a circuit evaluator
    Run {
        /// Oracle config JSON (defaults to the built-in suite)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for random scenarios
        #[arg(long)]
        seed: Option<u64>,
        /// Case count for random scenarios
        #[arg(long)]
        runs: Option<usize>,
        /// Directory to write repro bundles into
        #[arg(long)]
        repro_dir: Option<PathBuf>,
    },

    /// Run a test-vector corpus
    Corpus {
        /// Corpus JSON file
        #[arg(default_value = "corpus/corpus.json")]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn status(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILURE)
    }
}

fn print_version() -> Result<()> {
    println!("Poseidon Oracle v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "BN254 Fr, circomlib Poseidon ({})",
        PoseidonParameters::circom_t3()?.id()
    );
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Some(Commands::Version) => {
            print_version()?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            print_version()?;
            println!("Use --help for usage information");
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Hash { inputs, hex }) => {
            let out = PoseidonHash::circom(inputs.len())?.hash(&inputs)?;
            if hex {
                println!("{}", out.to_hex_be());
            } else {
                println!("{}", out);
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Params { arity, format }) => {
            let params = PoseidonParameters::circom(arity)?;
            match format {
                Format::Json => {
                    let table: ParamTable = params.to_table();
                    println!("{}", serde_json::to_string_pretty(&table)?);
                }
                Format::Text => {
                    println!("id: {}", params.id());
                    println!("width: {}", params.width());
                    println!("full_rounds: {}", params.full_rounds());
                    println!("partial_rounds: {}", params.partial_rounds());
                    if let Some(c0) = params.round_constants(0).first() {
                        println!("C[0]: 0x{}", c0.to_hex_be());
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Witness {
            inputs,
            witness_out,
            r1cs_out,
        }) => {
            let circuit = PoseidonCircuit::circom(inputs.len())?;
            let witness = circuit.witness(&inputs)?;
            std::fs::write(&witness_out, witness.to_snarkjs_json()?)
                .with_context(|| format!("writing {}", witness_out.display()))?;
            if let Some(path) = r1cs_out {
                std::fs::write(&path, circuit.constraint_system().to_snarkjs_json()?)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Verify {
            witness,
            r1cs,
            inputs,
            checks,
            all_violations,
            format,
        }) => {
            let w = Witness::from_snarkjs_file(&witness)
                .with_context(|| format!("reading witness {}", witness.display()))?;
            let cs = ConstraintSystem::from_snarkjs_file(&r1cs)
                .with_context(|| format!("reading R1CS {}", r1cs.display()))?;
            let reference = PoseidonHash::circom(inputs.len())?.hash(&inputs)?;
            let mode = if all_violations {
                ViolationMode::All
            } else {
                ViolationMode::FirstOnly
            };
            let report = WitnessVerifier::new(mode).verify(&w, reference, &cs, &checks);
            match format {
                Format::Json => println!("{}", report.to_json()),
                Format::Text => {
                    println!("reference: {}", reference);
                    println!("{}", report.summary());
                }
            }
            Ok(status(report.passed()))
        }
        Some(Commands::Run {
            config,
            seed,
            runs,
            repro_dir,
        }) => {
            let mut config = match config {
                Some(path) => OracleConfig::from_json_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => OracleConfig::default(),
            };
            if seed.is_some() {
                config.seed = seed;
            }
            if runs.is_some() {
                config.runs = runs;
            }
            if let Some(dir) = &repro_dir {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }

            let oracle = config.build_oracle()?;
            let mut rng = ChaChaSource::new(config.seed);
            let results = oracle.run_suite(&config.scenarios(), &mut rng);

            let mut ok = true;
            for result in &results {
                println!("{}", result.summary());
                for failure in &result.failures {
                    print!("{}", failure.repro.to_report());
                    if let Some(dir) = &repro_dir {
                        let path = dir.join(failure.repro.file_name());
                        std::fs::write(&path, failure.repro.to_json()?)
                            .with_context(|| format!("writing {}", path.display()))?;
                    }
                }
                for error in &result.error_details {
                    println!("  case {}: {}", error.case, error.error);
                }
                ok &= result.all_passed();
            }
            Ok(status(ok))
        }
        Some(Commands::Corpus { path }) => {
            let runner = CorpusRunner::load(&path)
                .with_context(|| format!("loading corpus {}", path.display()))?;
            if runner.vector_count() == 0 {
                bail!("corpus {} has no vectors", path.display());
            }
            let results = runner.run_all();
            for (id, result) in results.problems() {
                match result {
                    TestResult::Fail { expected, actual } => {
                        println!("FAIL {}: expected {}, got {}", id, expected, actual)
                    }
                    TestResult::Error { message } => println!("ERROR {}: {}", id, message),
                    _ => {}
                }
            }
            println!("{}", results.summary());
            Ok(status(results.all_passed()))
        }
    }
}
