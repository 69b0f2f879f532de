use clap::{Parser as CommandLineParser, ValueEnum};
use llvm_lib::{
    analysis::{Analyses, get_analysis_results},
    builder::read_module,
    cdg::ControlDependenceGraph,
    cfg::Cfg,
    error::{AnalysisError, TranslationError},
    ir::{Module, ValueId},
    raw::JsonReader,
    render::{cdg_to_dot, cfg_to_dot},
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum CLIAnalyses {
    Escape,
}

impl From<CLIAnalyses> for Analyses {
    fn from(value: CLIAnalyses) -> Self {
        match value {
            CLIAnalyses::Escape => Analyses::Escape,
        }
    }
}

#[derive(Debug, CommandLineParser, Default)]
#[command(name = "llvm", version, about = "Build and analyze LLVM IR modules.")]
pub struct Opt {
    /// Dump the control flow graph of the functions in graphviz format.
    #[arg(long)]
    pub dump_cfg: bool,

    /// Dump the control dependence graph of the functions in graphviz format.
    #[arg(long)]
    pub dump_cdg: bool,

    /// Only dump the graphs of this function.
    #[arg(long, value_name = "NAME")]
    pub function: Option<String>,

    /// Name of the analysis to execute
    #[arg(long, value_name = "ANALYSIS_NAME")]
    pub analyze: Option<CLIAnalyses>,

    /// File containing the raw IR table in JSON.
    pub filename: String,
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("no function named {0}")]
    UnknownFunction(String),
}

/// The functions whose graphs are dumped.
fn selected_functions(module: &Module, opts: &Opt) -> Result<Vec<ValueId>, DriverError> {
    match &opts.function {
        Some(name) => module
            .function_by_name(name)
            .map(|id| vec![id])
            .ok_or_else(|| DriverError::UnknownFunction(name.clone())),
        None => Ok(module.defined_functions().collect()),
    }
}

pub fn process_source(src: &str, opts: &Opt) -> Result<String, DriverError> {
    let module = read_module(JsonReader::new(src.as_bytes()))?;
    info!(
        module = %module.identifier,
        functions = module.functions.len(),
        globals = module.globals.len(),
        "Module loaded"
    );

    let mut output = String::new();
    if opts.dump_cfg || opts.dump_cdg {
        for function in selected_functions(&module, opts)? {
            let cfg = Cfg::new(&module, function)?;
            if opts.dump_cfg {
                output += &cfg_to_dot(&module, &cfg);
            }
            if opts.dump_cdg {
                output += &cdg_to_dot(&module, &ControlDependenceGraph::new(&cfg));
            }
        }
    }

    if let Some(analysis) = opts.analyze {
        output += &get_analysis_results(analysis.into(), &module)?;
    }

    Ok(output)
}
