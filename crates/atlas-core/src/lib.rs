#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod normalize;
pub mod traits;
pub mod types;

pub use corpus::load_corpus;
pub use error::{Error, Result};
pub use traits::Embedder;
pub use types::{Corpus, DocId, Document, Name, SearchHit};
