pub mod controller;
pub mod error;
pub mod history;
pub mod image_editor;
pub mod image_io;
pub mod processor;
