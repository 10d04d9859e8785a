#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod format;
pub mod layout;
pub mod model;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use layout::compute_layout;
pub use model::{ClassModel, ClassNode, Member, RelationshipLink};
pub use render::render_svg;
pub use theme::Theme;
