pub mod streaming_calculators;
pub mod tuple_range;

pub use tuple_range::{
    OptionallyRestricted,
    TupleRange,
    TupleRangeError,
};
