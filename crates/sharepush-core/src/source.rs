use crate::error::Result;
use crate::records::RecordStore;

/// Anything that can produce the record collections a run formats from.
pub trait RecordSource: Send + Sync {
    fn name(&self) -> &str;
    fn load(&self) -> Result<RecordStore>;
}
