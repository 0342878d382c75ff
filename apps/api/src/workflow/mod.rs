// Lead qualification workflow: submit a lead and call it, analyze the finished call,
// view the stored result. Each operation is one discrete operator action.

pub mod handlers;
pub mod lead_workflow;

pub use lead_workflow::{AnalyzeOutcome, LeadWorkflow, NewLeadRequest, SubmittedLead};
