//! Reusable UI building blocks for admin pages.

pub mod data_table;
pub mod form;
pub mod layout;
pub mod list_view;
pub mod notice;

pub use layout::Chrome;
pub use notice::Notice;
