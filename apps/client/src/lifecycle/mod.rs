// Resume lifecycle: upload → parsing → enhancement → export.
// All backend access goes through `ResumeBackend`; the live implementation is `ApiClient`.

pub mod backend;
pub mod poller;
pub mod state;
pub mod tracker;
pub mod versions;

pub use backend::ResumeBackend;
pub use poller::{PollHandle, ResumeWatcher};
pub use state::LifecycleState;
pub use tracker::{EnhancementOptions, ResumeTracker, TrackerSnapshot};
pub use versions::{EnhancedVersion, SuggestionDraft, VersionCollection, VersionKey};
