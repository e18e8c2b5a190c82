// Recommendation engine: eligibility matching, premium estimation, template
// and model-generated narratives.
// All model calls go through llm_client via the orchestrator.

pub mod eligibility;
pub mod handlers;
pub mod orchestrator;
pub mod pipeline;
pub mod premium;
pub mod prompts;
pub mod template;
