pub mod api;
pub mod auth;
pub mod branch;
pub mod date_range;
pub mod filter;
pub mod lead;
pub mod pipeline;
pub mod status_update;
pub mod tabs;
pub mod task;
pub mod user;

pub use api::{ApiResponse, DeleteRequest, ListQuery, Paginated, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use auth::{LoginRequest, LoginResponse};
pub use branch::{Branch, CreateBranchRequest, UpdateBranchRequest};
pub use date_range::{
    normalize_to_noon, parse_api_date, parse_bounds, to_api_date, DateRange, DateRangeError,
};
pub use filter::{all_paths, pipeline_labels, search_matches, tab_counts, tab_matches, LeadFilter};
pub use lead::{
    AssignLeadRequest, CreateLeadRequest, Lead, LeadHistoryEntry, LeadHistoryResponse,
    UpdateLeadRequest, UpdateLeadStatusRequest,
};
pub use pipeline::{
    ContactOutcome, DepositStatus, FlagChainError, FlagVector, HotAccount, Interest, LeadStatus,
    PipelineStage, Temperature,
};
pub use status_update::{
    AnsweredChoice, DepositChoice, HotLeadChoice, InterestChoice, LeadTypeChoice, StatusChoice,
    StatusError, StatusSelection, StatusUpdate, MAX_REMARKS_CHARS,
};
pub use tabs::{apply_selection, LeadRoute, TabError, TabLabel, TabPath, MAX_TAB_DEPTH};
pub use task::{CreateTaskRequest, Task, TaskPriority, TaskStatus, UpdateTaskRequest};
pub use user::{CreateUserRequest, UpdateUserRequest, User, UserRole};
