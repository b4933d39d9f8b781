//! Built-in node renderers.

mod block;
mod fallback;
mod highlight;
mod link;
mod list;
mod text;

pub use block::{HeadingRenderer, LinebreakRenderer, ParagraphRenderer, QuoteRenderer};
pub use fallback::UnknownNodeRenderer;
pub use highlight::CoralHighlightRenderer;
pub use link::LinkRenderer;
pub use list::{ListItemRenderer, ListRenderer};
pub use text::{HighlightVariant, TextRenderer};
