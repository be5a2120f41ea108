//! Resource handlers

pub mod record_mx;

pub use record_mx::RecordMx;
