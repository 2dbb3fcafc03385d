pub mod generate;
pub mod rest;

pub use generate::{ChatCompletionsGenerator, ContentGenerator, GeneratorConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use rest::{configure, RestApi};
