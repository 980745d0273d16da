//! `solmc`: lowers an annotated contract AST (`.ast.json`) into the C
//! model consumed by the verification harness.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{miette, IntoDiagnostic, WrapErr};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use solmc_analysis::{AnalysisStack, InvariantMode, TranslationConfig};
use solmc_ast::ast::SourceUnit;

#[derive(Parser)]
#[command(name = "solmc")]
#[command(about = "Translates annotated contract ASTs into C models for verification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InvariantArg {
    None,
    Existential,
    Universal,
}

impl From<InvariantArg> for InvariantMode {
    fn from(arg: InvariantArg) -> Self {
        match arg {
            InvariantArg::None => InvariantMode::None,
            InvariantArg::Existential => InvariantMode::Existential,
            InvariantArg::Universal => InvariantMode::Universal,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Translate an annotated AST into target source.
    Translate {
        /// Annotated AST, as produced by the front end (`.ast.json`).
        input: PathBuf,

        /// Write the output here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit forward declarations only.
        #[arg(long)]
        forward_declare: bool,

        /// Advance block number and timestamp only on a non-deterministic
        /// take-step flag.
        #[arg(long)]
        lockstep_time: bool,

        /// Whether map invariants are declared and enforced.
        #[arg(long, value_enum, default_value_t = InvariantArg::None)]
        invariants: InvariantArg,

        /// Root contracts of the model, in actor order. Empty models the
        /// whole source.
        #[arg(long, value_delimiter = ',')]
        model: Vec<String>,
    },

    /// Print the computed model (deployment closure, interfaces, maps)
    /// as JSON.
    Analyze {
        input: PathBuf,

        #[arg(long, value_delimiter = ',')]
        model: Vec<String>,
    },
}

fn load_unit(path: &PathBuf) -> miette::Result<SourceUnit> {
    let text = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("parsing {}", path.display()))
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Translate {
            input,
            output,
            forward_declare,
            lockstep_time,
            invariants,
            model,
        } => {
            let unit = load_unit(&input)?;
            let config = TranslationConfig {
                forward_declare,
                use_lockstep_time: lockstep_time,
                invariant_mode: invariants.into(),
                model,
            };
            let translated =
                solmc_codegen::translate(&unit, &config).map_err(|e| miette!("{e}"))?;
            match output {
                Some(path) => {
                    fs::write(&path, translated)
                        .into_diagnostic()
                        .wrap_err_with(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "translation written");
                }
                None => print!("{translated}"),
            }
        }
        Commands::Analyze { input, model } => {
            let unit = load_unit(&input)?;
            let config = TranslationConfig {
                model,
                ..Default::default()
            };
            let stack = AnalysisStack::build(&unit, &config).map_err(|e| miette!("{e}"))?;

            let contracts: Vec<_> = stack
                .dependance
                .get_model()
                .iter()
                .map(|&cid| {
                    let interface: Vec<_> = stack
                        .dependance
                        .get_interface(cid)
                        .iter()
                        .map(|&fid| {
                            let calls: Vec<_> = stack
                                .dependance
                                .get_function_roi(fid)
                                .into_iter()
                                .flatten()
                                .map(|&callee| stack.registry.function(callee).name.clone())
                                .collect();
                            let maps: Vec<_> = stack
                                .dependance
                                .get_map_roi(fid)
                                .into_iter()
                                .flatten()
                                .filter_map(|&decl| stack.types.map_db().resolve(decl))
                                .map(|entry| entry.struct_name())
                                .collect();
                            json!({
                                "name": stack.registry.function(fid).name,
                                "reaches": calls,
                                "maps": maps,
                            })
                        })
                        .collect();
                    json!({
                        "name": stack.types.contract_name(cid),
                        "interface": interface,
                    })
                })
                .collect();
            let maps: Vec<_> = stack
                .types
                .map_db()
                .entries()
                .iter()
                .map(|entry| {
                    json!({
                        "id": entry.id,
                        "name": entry.struct_name(),
                        "path": entry.display,
                        "depth": entry.keys.len(),
                    })
                })
                .collect();
            let report = json!({
                "model": contracts,
                "maps": maps,
                "addresses": {
                    "size": stack.addresses.size(),
                    "clients": stack.addresses.client_count(),
                },
            });
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
    }
    Ok(())
}
