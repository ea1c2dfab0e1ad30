pub mod cancel;
pub mod handlers;
pub mod inflight;
pub mod lookup;
pub mod pipeline;

pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use handlers::{AppState, router};
pub use inflight::{InFlight, PassGuard};
pub use lookup::{ArasaacClient, LookupError, PictogramLookup};
pub use pipeline::{MAX_PICTOGRAMS, TranslateStatus, Translation, Translator};
