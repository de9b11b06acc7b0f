//! Reusable rich renderables.

mod data_table;
mod detail_panel;

pub use data_table::DataTable;
pub use detail_panel::DetailPanel;
