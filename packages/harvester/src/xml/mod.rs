//! XML decoding into a generic JSON tree.

mod decode;

pub use decode::{decode, element_children, get_tag_name, TEXT_KEY};
