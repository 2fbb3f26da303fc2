pub mod enhanced;
pub mod export;
pub mod resume;
pub mod usage;
pub mod user;

pub use enhanced::{
    AnalyzeRequest, EnhanceRequest, EnhancedResume, EnhancementType, Language, Mode,
    SuggestionRequest, SuggestionResponse, TranslateRequest,
};
pub use export::{DirectFormat, ExportEnvelope, ExportFormat, ExportRequest};
pub use resume::{ParsedResume, Resume, TextResumeRequest};
pub use usage::{UsageLimits, UsageReset};
pub use user::{AuthRequest, AuthResponse, Session, User};
