pub mod consistency;
pub mod text;

pub use consistency::{ConsistencyRequest, ConsistencyResponse};
pub use text::{RectTextRequest, RectTextResponse, TextRequest, TextResponse};
