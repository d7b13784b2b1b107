use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// RFC 1123 date, as used in `Date` and `Last-Modified`.
pub struct HttpDate(pub SystemTime);

impl fmt::Display for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let datetime = DateTime::<Utc>::from(self.0);
        write!(f, "{}", datetime.format("%a, %d %b %Y %H:%M:%S GMT"))
    }
}

/// Short day and minute stamp for directory listings.
pub struct ShortDate(pub SystemTime);

impl fmt::Display for ShortDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let datetime = DateTime::<Utc>::from(self.0);
        write!(f, "{}", datetime.format("%d-%b-%Y %H:%M"))
    }
}
