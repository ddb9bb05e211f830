mod controller;
mod extract;
mod loop_worker;

pub use controller::SamplerController;
pub use extract::extract_visible_text;
