pub mod footer;
pub mod header;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{
  format_optional_timestamp, format_timestamp, status_color, status_icon, status_label, truncate,
};
