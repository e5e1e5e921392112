pub mod client;
pub mod parser;

pub use client::{resolve_link, LetterboxdHttpClient};
pub use parser::{parse_detail_page, parse_list_page, ListPage};
