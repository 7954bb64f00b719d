pub mod dates;
pub mod header;

pub use dates::{coerce_date, parse_date};
pub use header::{parse_buckets, split_bucket_header};
