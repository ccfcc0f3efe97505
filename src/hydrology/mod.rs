//! Hydrology: D8 flow routing and lake basins
//!
//! Flow routing runs first; basin detection walks the upstream relation it
//! produces. River marking happens later, in the biome classifier.

pub mod basins;
pub mod flow;

pub use basins::{detect_lakes, max_lake_area, Basin, LakeDetection};
pub use flow::{FlowNetwork, NO_FLOW};
