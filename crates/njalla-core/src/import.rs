//! Import identifier parsing
//!
//! Records are adopted with an identifier of the form `domain:id`, since
//! record IDs are only unique within their domain.

use crate::error::{Error, Result};
use crate::record::RecordId;

/// Parse a `domain:id` import identifier
///
/// # Example
///
/// ```rust
/// use njalla_core::import::parse_import_id;
///
/// let (domain, id) = parse_import_id("example.com:42").unwrap();
/// assert_eq!(domain, "example.com");
/// assert_eq!(id, 42);
/// ```
pub fn parse_import_id(import_id: &str) -> Result<(String, RecordId)> {
    let malformed = || {
        Error::invalid_input(format!(
            "import id {import_id:?} is not of the form domain:id"
        ))
    };

    let (domain, id) = import_id.split_once(':').ok_or_else(malformed)?;
    if domain.is_empty() || id.contains(':') {
        return Err(malformed());
    }

    let id: RecordId = id.parse().map_err(|_| malformed())?;
    if id < 0 {
        return Err(malformed());
    }

    Ok((domain.to_string(), id))
}

/// Format a `domain:id` import identifier
pub fn format_import_id(domain: &str, id: RecordId) -> String {
    format!("{domain}:{id}")
}
