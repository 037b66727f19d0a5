#![doc = include_str!("../README.md")]

// Re-export main structures
pub use crate::models::{
    FeatureList,
    FeatureRow,
    IdentityId,
    IonIdentity,
    IonModification,
    IonNetwork,
    IonType,
    NetworkId,
    RowId,
};
pub use crate::models::tolerance::{
    MzTolerance,
    MzToleranceCheck,
    Tolerance,
};
pub use crate::networking::{
    IonNetworkLibrary,
    IonNetworkingParameters,
};

// Declare modules
pub mod chemistry;
pub mod errors;
pub mod io;
pub mod models;
pub mod networking;
pub mod utils;

// Re-export errors
pub use crate::errors::{
    InputError,
    IonNetError,
    ModelError,
    XmlError,
};
