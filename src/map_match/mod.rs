pub mod grid;
pub mod matcher;
pub mod road;

pub use grid::RoadGrid;
pub use matcher::MapMatcher;
pub use road::RoadSegment;
