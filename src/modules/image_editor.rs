mod ie_main;
mod ie_ui;

pub use ie_main::{ImageEditor, Notice, NoticeKind};
