mod host;
mod location;

pub use self::host::HostRecord;
pub use self::location::Location;
