pub mod error_banner;
pub mod map_view;
pub mod marker_controls;
