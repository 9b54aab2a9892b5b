pub mod template;
pub mod yaml;

pub use template::Template;
