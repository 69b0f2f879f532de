use std::collections::BTreeMap;

use itertools::Itertools;
use rayon::prelude::*;

use crate::error::AnalysisError;
use crate::ir::{Module, ValueId, operand_name};

pub mod escape_analysis;

/// A per function analysis. The module is never mutated, so the functions
/// of a module are analyzed in parallel.
pub trait Analysis: Sync {
    type Summary: Send;

    fn analyze(&self, module: &Module, function: ValueId) -> Result<Self::Summary, AnalysisError>;

    /// One summary for every function with a body.
    fn analyze_all(
        &self,
        module: &Module,
    ) -> Result<BTreeMap<ValueId, Self::Summary>, AnalysisError> {
        let functions: Vec<_> = module.defined_functions().collect();
        let summaries = functions
            .par_iter()
            .map(|&function| {
                self.analyze(module, function)
                    .map(|summary| (function, summary))
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;
        Ok(summaries.into_iter().collect())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Analyses {
    Escape,
}

/// Runs an analysis on every function and prints one line per function.
pub fn get_analysis_results(analysis: Analyses, module: &Module) -> Result<String, AnalysisError> {
    match analysis {
        Analyses::Escape => {
            let summaries = escape_analysis::EscapeAnalysis.analyze_all(module)?;
            Ok(summaries
                .iter()
                .map(|(&function, summary)| {
                    let escaping = summary
                        .escaping_objects()
                        .into_iter()
                        .map(|id| operand_name(module, id))
                        .join(", ");
                    format!("{}: escaping [{escaping}]\n", operand_name(module, function))
                })
                .collect())
        }
    }
}
