// Everything the engine knows about music before it becomes sound: theme
// data, the routing of parts to instruments, and engine settings.
pub mod compose;
pub mod config;
pub mod library;
pub mod persistence;
pub mod routing;
pub mod theme;

pub use config::{CompressorConfig, EngineConfig, ReverbConfig};
pub use routing::{Route, RoutingTable};
pub use theme::{Drum, Note, Section, Step, Theme, ThemeId, ThemeLibrary};
