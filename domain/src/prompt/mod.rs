//! Prompt templates for the discussion flow

mod template;

pub use template::PromptTemplate;
