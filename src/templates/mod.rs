//! HTML templates and styling for the PSC map.
//!
//! ## Module Structure
//!
//! - `styles` - CSS for the map page and legend
//! - `components` - HTML escaping, popups, legend and the page shell
//! - `map_js` - Browser glue that forwards UI events to the API and replays
//!   the render commands it gets back

mod components;
mod map_js;
mod styles;

pub use components::{base_html, html_escape, legend_html, map_page, popup_html, COMPANIES_HOUSE};
pub use map_js::render_map_js;
pub use styles::STYLE;
