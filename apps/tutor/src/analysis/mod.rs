// Stateless one-shot analyses that reuse the AI client without touching the
// chat transcript: resume review and uploaded dataset insights.

pub mod dataset;
pub mod handlers;
pub mod resume;
