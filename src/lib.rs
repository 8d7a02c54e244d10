pub mod config;
pub mod frontmatter;
pub mod highlights;
pub mod refresh;
pub mod render;
pub mod vault;


pub use config::Settings;
pub use highlights::{collect_highlights, Highlight};
pub use refresh::{HighlightService, RefreshStatus, ViewState};
pub use render::{DisplayOptions, DisplaySurface, TextSurface};
pub use vault::{DocumentSource, FsVault};
