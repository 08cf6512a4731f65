pub mod compile;
pub mod fingerprint;
pub mod media;
pub mod query;
pub mod request;
pub mod result;

pub use compile::{CallerScope, QueryCompiler, ReferenceImages, ReferenceRequest};
pub use fingerprint::{Fingerprint, fingerprint};
pub use query::CompiledQuery;
pub use request::SearchRequest;
