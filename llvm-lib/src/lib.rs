//! An immutable, fully linked model of LLVM IR and the analyses over it.
//!
//! A raw IR reader produces a flat [table](raw::RawModule) of records that
//! refer to each other by key. The [builder] turns it into a [Module](ir::Module)
//! where every reference is a dense [`ValueId`](ir::ValueId) into the
//! module's arena. Control flow graphs, postdominator trees and control
//! dependence graphs are derived per function, and client analyses run the
//! dataflow solver of the `analysis` crate over them.

pub mod analysis;
pub mod builder;
pub mod cdg;
pub mod cfg;
pub mod error;
pub mod ir;
pub mod raw;
pub mod render;

#[cfg(test)]
mod test_utils;


#[cfg(test)]
mod cfg_tests;

#[cfg(test)]
mod cdg_tests;
