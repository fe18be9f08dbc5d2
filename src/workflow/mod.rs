pub mod session;

pub use session::{
    DocumentSession, ExitDecision, PageThumbnail, PendingInsert, PendingSave, RejectedInsert,
    SessionError,
};
