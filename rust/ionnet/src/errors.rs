use std::fmt::Display;
use std::path::PathBuf;

use crate::chemistry::FormulaError;
use crate::models::feature_row::RowId;

#[derive(Debug)]
pub enum IonNetError {
    XmlError(XmlError),
    ModelError(ModelError),
    FormulaError(FormulaError),
    InputError(InputError),
}

impl Display for IonNetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XmlError(e) => write!(f, "XML error: {}", e),
            Self::ModelError(e) => write!(f, "{}", e),
            Self::FormulaError(e) => write!(f, "Formula error: {}", e),
            Self::InputError(e) => write!(f, "{:?}", e),
        }
    }
}

impl std::error::Error for IonNetError {}

#[derive(Debug)]
pub enum XmlError {
    Parse(roxmltree::Error),
    UnexpectedElement {
        expected: &'static str,
        found: String,
    },
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    InvalidAttribute {
        attribute: &'static str,
        value: String,
    },
}

impl Display for XmlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{}", e),
            Self::UnexpectedElement { expected, found } => {
                write!(f, "expected element <{}>, found <{}>", expected, found)
            }
            Self::MissingAttribute { element, attribute } => {
                write!(f, "<{}> is missing the '{}' attribute", element, attribute)
            }
            Self::InvalidAttribute { attribute, value } => {
                write!(f, "invalid value '{}' for attribute '{}'", value, attribute)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// m/z and neutral mass are undefined for uncharged ion types.
    ZeroCharge { ion: String },
    UnknownRow(RowId),
    DuplicateRow(RowId),
    EmptyFormulaList,
    FormulaNotFound { formula: String },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroCharge { ion } => write!(f, "Ion type {} has no charge", ion),
            Self::UnknownRow(id) => write!(f, "Row {} is not part of the feature list", id),
            Self::DuplicateRow(id) => write!(f, "Row {} was added twice", id),
            Self::EmptyFormulaList => write!(f, "No candidate formulas"),
            Self::FormulaNotFound { formula } => {
                write!(f, "Formula {} is not a candidate", formula)
            }
        }
    }
}

#[derive(Debug)]
pub enum InputError {
    FileReadingError {
        source: std::io::Error,
        path: PathBuf,
    },
    FeatureTableParsingError {
        source: serde_json::Error,
        context: &'static str,
    },
}

impl From<XmlError> for IonNetError {
    fn from(e: XmlError) -> Self {
        IonNetError::XmlError(e)
    }
}

impl From<roxmltree::Error> for IonNetError {
    fn from(e: roxmltree::Error) -> Self {
        IonNetError::XmlError(XmlError::Parse(e))
    }
}

impl From<ModelError> for IonNetError {
    fn from(e: ModelError) -> Self {
        IonNetError::ModelError(e)
    }
}

impl From<FormulaError> for IonNetError {
    fn from(e: FormulaError) -> Self {
        IonNetError::FormulaError(e)
    }
}

impl From<InputError> for IonNetError {
    fn from(e: InputError) -> Self {
        IonNetError::InputError(e)
    }
}

pub type Result<T> = std::result::Result<T, IonNetError>;
