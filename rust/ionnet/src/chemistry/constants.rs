/// Electron rest mass, as used for the `e` adducts.
pub const MASS_ELECTRON: f64 = 0.00054858;
pub const MASS_PROTON: f64 = 1.007276;
/// 13C - 12C mass difference.
pub const MASS_C13_SHIFT: f64 = 1.003354838;

/// Neutral mass bins per dalton used to group identities into networks.
pub const NEUTRAL_MASS_BINS_PER_DA: f64 = 10.0;
