pub mod library;
pub mod logic;
pub mod relations;
pub mod search;
pub mod sorter;

pub use library::{
    IonNetworkLibrary,
    LibraryConfig,
};
pub use relations::find_modification_relations;
pub use search::{
    AdductLink,
    CheckMode,
    IonNetworkingParameters,
    search,
};
pub use sorter::{
    NetworkSorter,
    SortingDirection,
    SortingProperty,
};
