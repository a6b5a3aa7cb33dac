pub mod builtin;
mod catalog;
mod compose;

pub use catalog::{PromptCatalog, PromptSource, ResolvedPrompt};
pub use compose::{
    ReferenceLayout, build_instruction, composition_template_name, repair_instruction, role_legend,
};
