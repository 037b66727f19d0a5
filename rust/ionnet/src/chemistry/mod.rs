pub mod constants;
pub mod formula;

pub use formula::{
    FormulaError,
    MolecularFormula,
};
