/// Interactive chart viewer widgets.
pub mod panels;
pub mod plot;
