// Core modules implementing the value model, handler dispatch, and error modeling.
pub mod error;
pub mod handler;
pub mod mark;
pub mod registry;
pub mod revive;
pub mod value;
