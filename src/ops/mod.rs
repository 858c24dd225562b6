pub mod apply;
pub mod check;
pub mod completion;
pub mod drag;
pub mod editor;
pub mod flatten;
pub mod import;
pub mod indent;
pub mod item_ops;
pub mod mover;
pub mod sections;
