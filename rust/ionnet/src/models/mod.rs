pub mod defaults;
pub mod feature_list;
pub mod feature_row;
pub mod identity;
pub mod ion_type;
pub mod modification;
pub mod network;
pub mod tolerance;

pub use feature_list::{
    FeatureList,
    FeatureRows,
};
pub use feature_row::{
    FeatureRow,
    RowId,
};
pub use identity::{
    FormulaCandidate,
    FormulaCandidates,
    IdentityId,
    IonIdentity,
    Ms2Evidence,
};
pub use ion_type::IonType;
pub use modification::{
    IonModification,
    ModificationKind,
    Polarity,
};
pub use network::{
    IonNetwork,
    NetworkId,
    NetworkRelation,
};
pub use tolerance::{
    MzTolerance,
    MzToleranceCheck,
    RtTolerance,
    Tolerance,
};
