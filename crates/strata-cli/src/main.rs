use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use strata::graph::{Edge, GraphInput, GraphModel, NodeId};
use strata::{Formulation, LayerAssignment, LayoutOptions, SolverConfig, SolverSession};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Strata(strata::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Strata(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<strata::Error> for CliError {
    fn from(value: strata::Error) -> Self {
        Self::Strata(value)
    }
}

impl From<strata::graph::GraphError> for CliError {
    fn from(value: strata::graph::GraphError) -> Self {
        Self::Strata(value.into())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    Analyze,
    Layer,
    #[default]
    Layout,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    verbose: bool,
    formulation: Formulation,
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
    big_m: Option<u64>,
    no_break_cycles: bool,
    no_crossings: bool,
    solver_config: Option<String>,
}

#[derive(Serialize)]
struct LayerOut<'a> {
    formulation: &'a Formulation,
    removed_edges: &'a [Edge],
    #[serde(flatten)]
    assignment: &'a LayerAssignment,
    layers: BTreeMap<u32, Vec<NodeId>>,
}

fn usage() -> String {
    "strata-cli\n\
\n\
USAGE:\n\
  strata-cli analyze [--pretty] [<path>|-]\n\
  strata-cli layer [--formulation <name>] [TORUS OPTIONS] [--no-break-cycles] [--solver-config <path>] [--pretty] [--verbose] [<path>|-]\n\
  strata-cli [layout] [--formulation <name>] [TORUS OPTIONS] [--no-break-cycles] [--no-crossings] [--solver-config <path>] [--pretty] [--verbose] [<path>|-]\n\
\n\
FORMULATIONS:\n\
  difference (default), quadratic_span, flow_selection, torus\n\
\n\
TORUS OPTIONS:\n\
  --alpha <w>  --beta <w>  --gamma <w>  --big-m <n>\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the graph is read from stdin as JSON:\n\
    {\"nodes\": [0, 1], \"edges\": [[0, 1]], \"weights\": [[0, 1, 2.0]], \"min_spans\": [[0, 1, 1]]}\n\
  - Without --solver-config the solver is configured from STRATA_SOLVER_* variables.\n\
  - Logs go to stderr; RUST_LOG filters them and --verbose raises them to debug.\n\
  - Exit codes: 2 usage error, 3 infeasible model, 1 any other failure.\n\
"
    .to_string()
}

fn usage_error(msg: impl std::fmt::Display) -> CliError {
    CliError::Usage(format!("{msg}\n\n{}", usage()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "analyze" => args.command = Command::Analyze,
            "layer" => args.command = Command::Layer,
            "layout" => args.command = Command::Layout,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "--no-break-cycles" => args.no_break_cycles = true,
            "--no-crossings" => args.no_crossings = true,
            "--formulation" => {
                let Some(name) = it.next() else {
                    return Err(usage_error("--formulation needs a value"));
                };
                args.formulation = name.parse::<Formulation>().map_err(usage_error)?;
            }
            "--alpha" | "--beta" | "--gamma" => {
                let Some(raw) = it.next() else {
                    return Err(usage_error(format!("{a} needs a value")));
                };
                let w = raw
                    .parse::<f64>()
                    .map_err(|_| usage_error(format!("{a} must be a number, got `{raw}`")))?;
                match a.as_str() {
                    "--alpha" => args.alpha = Some(w),
                    "--beta" => args.beta = Some(w),
                    _ => args.gamma = Some(w),
                }
            }
            "--big-m" => {
                let Some(raw) = it.next() else {
                    return Err(usage_error("--big-m needs a value"));
                };
                args.big_m = Some(raw.parse::<u64>().map_err(|_| {
                    usage_error(format!("--big-m must be a non-negative integer, got `{raw}`"))
                })?);
            }
            "--solver-config" => {
                let Some(path) = it.next() else {
                    return Err(usage_error("--solver-config needs a path"));
                };
                args.solver_config = Some(path.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(usage_error("more than one input given"));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(usage_error("more than one input given"));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(usage_error(format!("unknown flag `{other}`")));
            }
            path => {
                if args.input.is_some() {
                    return Err(usage_error("more than one input given"));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    let torus_flags = args.alpha.is_some()
        || args.beta.is_some()
        || args.gamma.is_some()
        || args.big_m.is_some();
    match &mut args.formulation {
        Formulation::Torus(opts) => {
            if let Some(w) = args.alpha {
                opts.alpha = w;
            }
            if let Some(w) = args.beta {
                opts.beta = w;
            }
            if let Some(w) = args.gamma {
                opts.gamma = w;
            }
            if args.big_m.is_some() {
                opts.big_m = args.big_m;
            }
        }
        _ if torus_flags => {
            return Err(usage_error(
                "--alpha, --beta, --gamma and --big-m only apply to --formulation torus",
            ));
        }
        _ => {}
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_session(args: &Args) -> Result<SolverSession, CliError> {
    let config = match args.solver_config.as_deref() {
        Some(path) => SolverConfig::from_json_file(path)?,
        None => SolverConfig::from_env()?,
    };
    Ok(SolverSession::open(config)?)
}

fn read_graph(input: Option<&str>) -> Result<GraphModel, CliError> {
    let text = read_input(input)?;
    let input: GraphInput = serde_json::from_str(&text)?;
    Ok(input.into_model()?)
}

fn run(args: Args) -> Result<(), CliError> {
    let g = read_graph(args.input.as_deref())?;
    tracing::debug!(
        nodes = g.node_count(),
        edges = g.edge_count(),
        "graph loaded"
    );

    match args.command {
        Command::Analyze => write_json(&g.summary(), args.pretty),
        Command::Layer => {
            let session = open_session(&args)?;
            let (g, removed) = if args.formulation.requires_acyclic() && !args.no_break_cycles {
                strata::acyclic::remove_cycles(&g)
            } else {
                (g, Vec::new())
            };
            let assignment = strata::rank::assign_layers(&session, &g, &args.formulation)?;
            let out = LayerOut {
                formulation: &args.formulation,
                removed_edges: &removed,
                assignment: &assignment,
                layers: assignment.layers(),
            };
            write_json(&out, args.pretty)
        }
        Command::Layout => {
            let session = open_session(&args)?;
            let options = LayoutOptions {
                formulation: args.formulation,
                break_cycles: !args.no_break_cycles,
                reduce_crossings: !args.no_crossings,
            };
            let layout = strata::pipeline::layout(&session, &g, &options)?;
            write_json(&layout, args.pretty)
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err @ CliError::Strata(strata::Error::Infeasible { .. })) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
