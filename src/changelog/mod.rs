pub mod assembler;
pub mod category;
pub mod render;

pub use assembler::{AssemblerOptions, ChangelogAssembler, ChangelogDocument};
pub use category::GroupingMode;
pub use render::{ChangelogRenderer, OutputFormat, RenderOptions};
