pub mod dates;
pub mod money;

pub use money::round2;
